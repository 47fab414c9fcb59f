//! Report submission stage.

use chrono::Utc;

use crate::error::Result;
use crate::models::{ReportRequest, ReportSettings};
use crate::services::HistoricalSearchApi;
use crate::storage::JobStateStore;

/// Submits a report request and records the assigned job.
pub struct ReportSubmitter<'a> {
    api: &'a dyn HistoricalSearchApi,
    store: &'a JobStateStore,
}

impl<'a> ReportSubmitter<'a> {
    pub fn new(api: &'a dyn HistoricalSearchApi, store: &'a JobStateStore) -> Self {
        Self { api, store }
    }

    /// Build and post the submission, persisting the assigned job id.
    ///
    /// Replaces any previously tracked job. Previously downloaded artifacts
    /// are left alone.
    pub async fn submit(&self, report: &ReportSettings) -> Result<String> {
        let request = ReportRequest::build(report, Utc::now())?;
        log::debug!("Specified parameters are: {request:?}");

        log::info!("Submitting historical message trace report request...");
        let job_id = self.api.submit_report(&request).await?;

        self.store.save(&job_id).await?;
        log::debug!("Message trace report job id: {job_id}");
        log::info!("Successfully submitted message trace report!");

        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;
    use crate::models::ReportListing;

    /// Fake API recording submissions and handing out a fixed job id.
    struct RecordingApi {
        submitted: Mutex<Vec<ReportRequest>>,
    }

    impl RecordingApi {
        fn new() -> Self {
            Self {
                submitted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HistoricalSearchApi for RecordingApi {
        async fn submit_report(&self, request: &ReportRequest) -> Result<String> {
            self.submitted.lock().unwrap().push(request.clone());
            Ok("abc123".to_string())
        }

        async fn list_reports(&self) -> Result<ReportListing> {
            Err(AppError::protocol("test", "list_reports not scripted"))
        }
    }

    #[tokio::test]
    async fn test_submit_persists_assigned_job_id() {
        let tmp = TempDir::new().unwrap();
        let store = JobStateStore::new(tmp.path());
        let api = RecordingApi::new();

        let mut report = ReportSettings::default();
        report.title = "Trace".to_string();
        report.direction = "Inbound".to_string();

        let job_id = ReportSubmitter::new(&api, &store)
            .submit(&report)
            .await
            .unwrap();

        assert_eq!(job_id, "abc123");
        let content = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(content, "abc123\n");
    }

    #[tokio::test]
    async fn test_submit_builds_expected_request_body() {
        let tmp = TempDir::new().unwrap();
        let store = JobStateStore::new(tmp.path());
        let api = RecordingApi::new();

        let mut report = ReportSettings::default();
        report.title = "Trace".to_string();
        report.direction = "Inbound".to_string();

        ReportSubmitter::new(&api, &store)
            .submit(&report)
            .await
            .unwrap();

        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let request = &submitted[0];
        assert!(request.report_title.starts_with("Trace_"));
        assert_eq!(request.direction, "Inbound");
        assert!(request.message_id.is_empty());
        assert!(request.notify_address.is_none());
    }

    #[tokio::test]
    async fn test_submit_fails_before_network_on_bad_notify_config() {
        let tmp = TempDir::new().unwrap();
        let store = JobStateStore::new(tmp.path());
        let api = RecordingApi::new();

        let mut report = ReportSettings::default();
        report.notify = true;
        report.notify_address = String::new();

        let result = ReportSubmitter::new(&api, &store).submit(&report).await;

        assert!(result.is_err());
        assert!(api.submitted.lock().unwrap().is_empty());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_overwrites_previous_job() {
        let tmp = TempDir::new().unwrap();
        let store = JobStateStore::new(tmp.path());
        store.save("old-job").await.unwrap();

        let api = RecordingApi::new();
        ReportSubmitter::new(&api, &store)
            .submit(&ReportSettings::default())
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap(), Some("abc123".to_string()));
    }
}
