use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use crate::error::AppError;

/// `Json` body extractor that reports malformed or incomplete payloads as
/// the standard 400 validation error instead of axum's 422 rejection.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(AppJson(value))
    }
}
