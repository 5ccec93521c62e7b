pub mod auth;
pub mod company;
pub mod credential;
pub mod event;
pub mod participation;
pub mod user;
