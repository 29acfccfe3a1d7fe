// Library crate for the MediCare hospital management server
// This file exposes the public API for the binary and integration tests

pub mod appointment;
pub mod config;
pub mod database;
pub mod doctor;
pub mod patient;
pub mod routes;
pub mod schedule;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use routes::build_router;
pub use shared::{AppError, AppState};
