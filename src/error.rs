// src/error.rs

//! Unified error handling for the message trace tool.

use std::fmt;

use thiserror::Error;

/// Result type alias for message trace operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Browser session error
    #[error("Browser error: {0}")]
    Browser(#[from] thirtyfour::error::WebDriverError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authorization material missing or unreadable
    #[error("Auth error: {0}")]
    Auth(String),

    /// Remote response did not carry what the protocol requires
    #[error("Unexpected response from {context}: {message}")]
    Protocol { context: String, message: String },

    /// A bounded wait ran out before the job finished
    #[error("Gave up waiting for job {job_id} after {waited_secs}s")]
    PollTimeout { job_id: String, waited_secs: u64 },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an auth error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a protocol error with context.
    pub fn protocol(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Protocol {
            context: context.into(),
            message: message.to_string(),
        }
    }
}
