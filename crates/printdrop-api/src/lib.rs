//! Printdrop API Library
//!
//! This crate provides the HTTP handlers and application setup.

// Module declarations
pub mod constants;
mod handlers;
pub mod setup;
pub mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use setup::{initialize_app, Application};
