//! Report request and status listing wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ReportSettings;

/// Fixed lookback window for a historical search, in days.
const LOOKBACK_DAYS: i64 = 89;

/// Window bounds are rendered at midnight UTC with a fixed suffix.
const WINDOW_DATE_FORMAT: &str = "%Y-%m-%dT00:00:00.000Z";

/// Timestamp suffix appended to the report title.
const TITLE_STAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Body of a report submission, serialized with the service's field names.
///
/// Built fresh for each submission and never mutated afterwards. The
/// `NotifyAddress` field is only present when notification is enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportRequest {
    pub delivery_status: String,
    pub direction: String,
    pub end_date: String,
    #[serde(rename = "MessageID")]
    pub message_id: Vec<String>,
    #[serde(rename = "OriginalClientIP")]
    pub original_client_ip: String,
    pub recipient_address: Vec<String>,
    pub report_title: String,
    pub report_type: String,
    pub sender_address: Vec<String>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_address: Option<Vec<String>>,
}

impl ReportRequest {
    /// Build a submission from settings, anchored at `now`.
    ///
    /// The window is a fixed 89-day lookback ending today. The title gets a
    /// submission timestamp suffix, with quote characters stripped.
    ///
    /// Fails before anything touches the network when notification is
    /// enabled without an address to notify.
    pub fn build(report: &ReportSettings, now: DateTime<Utc>) -> Result<Self> {
        let notify_address = if report.notify {
            log::debug!("notify is enabled");
            if report.notify_address.trim().is_empty() {
                log::warn!("You need to specify a notification address!");
                return Err(AppError::config(
                    "notification enabled without a notify address",
                ));
            }
            Some(vec![report.notify_address.clone()])
        } else {
            log::debug!("Not going to set a notification address.");
            None
        };

        let start = now - chrono::Duration::days(LOOKBACK_DAYS);
        let title = format!("{}_{}", report.title, now.format(TITLE_STAMP_FORMAT)).replace('"', "");

        Ok(Self {
            delivery_status: String::new(),
            direction: report.direction.clone(),
            end_date: now.format(WINDOW_DATE_FORMAT).to_string(),
            message_id: report.message_id.clone(),
            original_client_ip: report.original_client_ip.clone(),
            recipient_address: report.recipient_address.clone(),
            report_title: title,
            report_type: report.report_type.clone(),
            sender_address: report.sender_address.clone(),
            start_date: start.format(WINDOW_DATE_FORMAT).to_string(),
            notify_address,
        })
    }
}

/// One entry of the historical search listing.
///
/// The listing mixes report types and ages; only the id and status matter
/// here, everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSummary {
    #[serde(rename = "id", alias = "Id", alias = "JobId", default)]
    pub id: String,

    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

/// Listing returned by the status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportListing {
    #[serde(rename = "value", default)]
    pub value: Vec<ReportSummary>,
}

impl ReportListing {
    /// Find the tracked job in the listing. First match wins when the
    /// service returns duplicate identifiers.
    pub fn find(&self, job_id: &str) -> Option<&ReportSummary> {
        self.value.iter().find(|entry| entry.id == job_id)
    }

    /// Status string for the tracked job, if the listing carries one.
    pub fn status_of(&self, job_id: &str) -> Option<&str> {
        self.find(job_id).and_then(|entry| entry.status.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 13, 5, 7).unwrap()
    }

    #[test]
    fn window_is_exactly_89_days_at_midnight() {
        let request = ReportRequest::build(&ReportSettings::default(), fixed_now()).unwrap();
        assert_eq!(request.end_date, "2024-04-01T00:00:00.000Z");
        assert_eq!(request.start_date, "2024-01-03T00:00:00.000Z");
    }

    #[test]
    fn title_carries_submission_timestamp() {
        let mut report = ReportSettings::default();
        report.title = "Trace".to_string();
        let request = ReportRequest::build(&report, fixed_now()).unwrap();
        assert_eq!(request.report_title, "Trace_2024-04-01_13:05:07");
    }

    #[test]
    fn title_strips_quote_characters() {
        let mut report = ReportSettings::default();
        report.title = "Tr\"ace".to_string();
        let request = ReportRequest::build(&report, fixed_now()).unwrap();
        assert!(!request.report_title.contains('"'));
        assert!(request.report_title.starts_with("Trace_"));
    }

    #[test]
    fn notify_disabled_omits_notify_address_key() {
        let request = ReportRequest::build(&ReportSettings::default(), fixed_now()).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("NotifyAddress").is_none());
    }

    #[test]
    fn notify_without_address_is_a_config_error() {
        let mut report = ReportSettings::default();
        report.notify = true;
        assert!(ReportRequest::build(&report, fixed_now()).is_err());
    }

    #[test]
    fn notify_with_address_is_serialized_as_list() {
        let mut report = ReportSettings::default();
        report.notify = true;
        report.notify_address = "soc@example.com".to_string();
        let request = ReportRequest::build(&report, fixed_now()).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["NotifyAddress"], json!(["soc@example.com"]));
    }

    #[test]
    fn submission_body_uses_service_field_names() {
        let mut report = ReportSettings::default();
        report.title = "Trace".to_string();
        report.direction = "Inbound".to_string();
        let request = ReportRequest::build(&report, fixed_now()).unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert!(
            body["ReportTitle"]
                .as_str()
                .unwrap()
                .starts_with("Trace_")
        );
        assert_eq!(body["Direction"], json!("Inbound"));
        assert_eq!(body["MessageID"], json!([]));
        assert_eq!(body["OriginalClientIP"], json!(""));
        assert_eq!(body["DeliveryStatus"], json!(""));
        assert!(body.get("StartDate").is_some());
        assert!(body.get("EndDate").is_some());
        assert!(body.get("NotifyAddress").is_none());
    }

    #[test]
    fn listing_parses_service_shape() {
        let listing: ReportListing = serde_json::from_value(json!({
            "value": [{"id": "abc123", "Status": "InProgress"}]
        }))
        .unwrap();
        assert_eq!(listing.status_of("abc123"), Some("InProgress"));
        assert_eq!(listing.status_of("other"), None);
    }

    #[test]
    fn listing_find_prefers_first_duplicate() {
        let listing: ReportListing = serde_json::from_value(json!({
            "value": [
                {"id": "abc123", "Status": "InProgress"},
                {"id": "abc123", "Status": "Done"}
            ]
        }))
        .unwrap();
        assert_eq!(listing.status_of("abc123"), Some("InProgress"));
    }

    #[test]
    fn listing_tolerates_missing_status() {
        let listing: ReportListing = serde_json::from_value(json!({
            "value": [{"id": "abc123"}]
        }))
        .unwrap();
        assert!(listing.find("abc123").is_some());
        assert_eq!(listing.status_of("abc123"), None);
    }
}
