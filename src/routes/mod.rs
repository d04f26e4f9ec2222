/// HTTP route handlers

pub mod admin;
pub mod auth;
pub mod books;
pub mod health_check;
pub mod password_reset;
pub mod roles;

pub use health_check::health_check;
