pub mod cli;
pub mod crypto;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod scheduling;
pub mod server;
pub mod webhook;

pub use models::*;

/// Default server URL for the salond API
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
