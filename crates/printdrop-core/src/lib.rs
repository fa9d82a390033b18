//! Printdrop Core Library
//!
//! This crate provides the domain models, error types, settings and
//! configuration shared by every Printdrop component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod settings;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{PhotoFile, PipelinePhase, ReleaseOutcome, ReleaseReport, Stage};
pub use settings::{
    ConfigError, ConfigProvider, JsonFileConfigProvider, PipelineConfig, Settings, StagePaths,
};
