pub mod auth;
pub mod cache;
pub mod configuration;
pub mod email_client;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod validators;
