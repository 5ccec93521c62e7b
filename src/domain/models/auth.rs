use serde::{Deserialize, Serialize};

/// JWT claims: the opaque signed credential maps back to exactly
/// {id, email, role}. Expiry is fixed at 24 hours.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}
