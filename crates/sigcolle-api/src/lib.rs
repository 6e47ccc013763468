pub mod auth;
pub mod campaign;
pub mod error;
pub mod markdown;
pub mod routes;
pub mod session;
pub mod views;
