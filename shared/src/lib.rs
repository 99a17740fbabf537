//! Shared library for the inventory service
//!
//! Holds the pieces every layer of the binary depends on:
//! - Configuration loaded from the environment
//! - The application error type and its HTTP rendering

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorResponse, Result};
