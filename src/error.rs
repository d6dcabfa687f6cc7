//! # Error Types
//!
//! This module defines error types used throughout the lanyard library.

use thiserror::Error;

/// Main error type for lanyard operations
#[derive(Debug, Error)]
pub enum LanyardError {
    /// Font discovery or registration failure
    #[error("Font error: {0}")]
    Font(String),

    /// Template image could not be loaded or decoded
    #[error("Template error: {0}")]
    Template(String),

    /// Drawing or PNG encoding failure for a row
    #[error("Render error: {0}")]
    Render(String),

    /// Dataset parsing error (CSV, field/mapping descriptors)
    #[error("Data error: {0}")]
    Data(String),

    /// Server-level error (bind, request handling)
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
