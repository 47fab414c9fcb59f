// src/models/mod.rs

//! Domain models for the message trace tool.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod auth;
mod config;
mod report;

// Re-export all public types
pub use auth::{AuthContext, Credentials};
pub use config::{BrowserSettings, PollSettings, ReportSettings, Settings};
pub use report::{ReportListing, ReportRequest, ReportSummary};
