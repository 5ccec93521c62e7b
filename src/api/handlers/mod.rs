pub mod auth;
pub mod company;
pub mod event;
pub mod health;
pub mod user;
