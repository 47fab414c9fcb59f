//! HTTP client for the admin historical search endpoints.
//!
//! Both calls are authorized by the externally obtained session cookie and
//! validation token; the interactive sign-in credentials are never used here.

use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{AuthContext, ReportListing, ReportRequest};

/// Report submission and status listing endpoint.
pub const HISTORICAL_SEARCH_URL: &str =
    "https://admin.exchange.microsoft.com/beta/HistoricalSearch";

/// Server-side filter restricting the listing to message trace reports.
pub const REPORT_TYPE_FILTER: &str =
    "ReportType eq 'MessageTrace' or ReportType eq 'MessageTraceDetail'";

/// Host name the service expects in its `authority` header.
const AUTHORITY: &str = "admin.exchange.microsoft.com";

/// Report submission and status listing operations.
#[async_trait]
pub trait HistoricalSearchApi: Send + Sync {
    /// Submit a report request, returning the assigned job id.
    async fn submit_report(&self, request: &ReportRequest) -> Result<String>;

    /// Fetch the current report listing.
    async fn list_reports(&self) -> Result<ReportListing>;
}

/// Client for the live admin endpoints, authorized by an [`AuthContext`].
pub struct ExchangeAdminClient {
    client: reqwest::Client,
    auth: AuthContext,
}

impl ExchangeAdminClient {
    /// Create a client around the given session material.
    pub fn new(auth: AuthContext) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, auth })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("authority", AUTHORITY)
            .header(
                header::COOKIE,
                format!(".AspNet.Cookies={}", self.auth.session_cookie),
            )
            .header("validationkey", &self.auth.validation_key)
    }
}

#[async_trait]
impl HistoricalSearchApi for ExchangeAdminClient {
    async fn submit_report(&self, request: &ReportRequest) -> Result<String> {
        let response = self
            .request(reqwest::Method::POST, HISTORICAL_SEARCH_URL)
            .json(request)
            .send()
            .await?;

        let data: Value = response.json().await?;
        log::debug!("Response from server: {data}");
        extract_job_id(&data)
    }

    async fn list_reports(&self) -> Result<ReportListing> {
        let response = self
            .request(reqwest::Method::GET, HISTORICAL_SEARCH_URL)
            .query(&[("$filter", REPORT_TYPE_FILTER)])
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

/// Pull the assigned job id out of a submission response.
///
/// A response without one means the protocol or the session broke; there is
/// nothing to poll for afterwards, so this is fatal to the run.
fn extract_job_id(data: &Value) -> Result<String> {
    data.get("JobId")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::protocol("report submission", "response carries no JobId"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extract_job_id_reads_submission_response() {
        assert_eq!(
            extract_job_id(&json!({"JobId": "abc123"})).unwrap(),
            "abc123"
        );
    }

    #[test]
    fn extract_job_id_rejects_missing_or_non_string_field() {
        assert!(extract_job_id(&json!({})).is_err());
        assert!(extract_job_id(&json!({"JobId": 17})).is_err());
        assert!(extract_job_id(&json!({"jobId": "abc123"})).is_err());
    }
}
