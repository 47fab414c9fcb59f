//! Service layer for the message trace tool.
//!
//! This module contains the report lifecycle stages:
//! - Submission (`ReportSubmitter`)
//! - Status polling (`StatusPoller`)
//! - Artifact collection (`ArtifactRetriever`)
//! - The admin endpoint client (`ExchangeAdminClient`)

mod client;
mod gather;
mod status;
mod submit;

pub use client::{
    ExchangeAdminClient, HISTORICAL_SEARCH_URL, HistoricalSearchApi, REPORT_TYPE_FILTER,
};
pub use gather::ArtifactRetriever;
pub use status::{STATUS_DONE, StatusPoller};
pub use submit::ReportSubmitter;
