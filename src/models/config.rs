//! Application settings structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Credentials;

/// Root application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Sign-in credentials for the browser session
    #[serde(default)]
    pub auth: Credentials,

    /// Report request fields
    #[serde(default)]
    pub report: ReportSettings,

    /// Poll pacing and bounds
    #[serde(default)]
    pub poll: PollSettings,

    /// Browser session behavior
    #[serde(default)]
    pub browser: BrowserSettings,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load settings or return defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Settings load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate settings values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.report.title.trim().is_empty() {
            return Err(AppError::config("report.title is empty"));
        }
        if self.report.report_type.trim().is_empty() {
            return Err(AppError::config("report.report_type is empty"));
        }
        if self.report.notify && self.report.notify_address.trim().is_empty() {
            return Err(AppError::config(
                "report.notify is set but report.notify_address is empty",
            ));
        }
        if self.poll.min_sleep_secs == 0 || self.poll.max_sleep_secs == 0 {
            return Err(AppError::config("poll sleep bounds must be > 0"));
        }
        if self.poll.min_sleep_secs > self.poll.max_sleep_secs {
            return Err(AppError::config(
                "poll.min_sleep_secs must not exceed poll.max_sleep_secs",
            ));
        }
        if self.poll.download_recheck_secs == 0 {
            return Err(AppError::config("poll.download_recheck_secs must be > 0"));
        }
        if self.browser.webdriver_url.trim().is_empty() {
            return Err(AppError::config("browser.webdriver_url is empty"));
        }
        if self.browser.element_timeout_secs == 0 || self.browser.persist_prompt_timeout_secs == 0
        {
            return Err(AppError::config("browser element timeouts must be > 0"));
        }
        Ok(())
    }
}

/// Fields of the report request, minus the computed window and title suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Base report title; the submission timestamp is appended to it
    #[serde(default = "defaults::report_title")]
    pub title: String,

    /// Report type tag sent to the service
    #[serde(default = "defaults::report_type")]
    pub report_type: String,

    /// Optional direction filter (e.g. "Inbound"); empty means no filter
    #[serde(default)]
    pub direction: String,

    /// Optional message identifier filter
    #[serde(default)]
    pub message_id: Vec<String>,

    /// Optional originating client IP filter
    #[serde(default)]
    pub original_client_ip: String,

    /// Optional recipient address filter
    #[serde(default)]
    pub recipient_address: Vec<String>,

    /// Optional sender address filter
    #[serde(default)]
    pub sender_address: Vec<String>,

    /// Ask the service to send a completion notification
    #[serde(default)]
    pub notify: bool,

    /// Address for the completion notification; required when `notify` is set
    #[serde(default)]
    pub notify_address: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: defaults::report_title(),
            report_type: defaults::report_type(),
            direction: String::new(),
            message_id: Vec::new(),
            original_client_ip: String::new(),
            recipient_address: Vec::new(),
            sender_address: Vec::new(),
            notify: false,
            notify_address: String::new(),
        }
    }
}

/// Pacing for the two retrieval loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    /// Lower bound of the randomized wait between status polls, in seconds
    #[serde(default = "defaults::min_sleep")]
    pub min_sleep_secs: u64,

    /// Upper bound of the randomized wait between status polls, in seconds
    #[serde(default = "defaults::max_sleep")]
    pub max_sleep_secs: u64,

    /// Wait between download directory re-checks, in seconds
    #[serde(default = "defaults::download_recheck")]
    pub download_recheck_secs: u64,

    /// Overall cap on waiting; absent means wait as long as the job takes
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            min_sleep_secs: defaults::min_sleep(),
            max_sleep_secs: defaults::max_sleep(),
            download_recheck_secs: defaults::download_recheck(),
            max_wait_secs: None,
        }
    }
}

/// Browser session settings for the download step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// WebDriver server to attach to
    #[serde(default = "defaults::webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window
    #[serde(default = "defaults::headless")]
    pub headless: bool,

    /// Hard wait for sign-in elements to become available, in seconds
    #[serde(default = "defaults::element_timeout")]
    pub element_timeout_secs: u64,

    /// Best-effort wait for the "stay signed in" prompt, in seconds
    #[serde(default = "defaults::persist_prompt_timeout")]
    pub persist_prompt_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::webdriver_url(),
            headless: defaults::headless(),
            element_timeout_secs: defaults::element_timeout(),
            persist_prompt_timeout_secs: defaults::persist_prompt_timeout(),
        }
    }
}

mod defaults {
    // Report defaults
    pub fn report_title() -> String {
        "MessageTrace".into()
    }
    pub fn report_type() -> String {
        "MessageTrace".into()
    }

    // Poll defaults
    pub fn min_sleep() -> u64 {
        700
    }
    pub fn max_sleep() -> u64 {
        1000
    }
    pub fn download_recheck() -> u64 {
        120
    }

    // Browser defaults
    pub fn webdriver_url() -> String {
        "http://localhost:4444".into()
    }
    pub fn headless() -> bool {
        true
    }
    pub fn element_timeout() -> u64 {
        10
    }
    pub fn persist_prompt_timeout() -> u64 {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_settings_ok() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_notify_without_address() {
        let mut settings = Settings::default();
        settings.report.notify = true;
        settings.report.notify_address = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_accepts_notify_with_address() {
        let mut settings = Settings::default();
        settings.report.notify = true;
        settings.report.notify_address = "soc@example.com".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_sleep_bounds() {
        let mut settings = Settings::default();
        settings.poll.min_sleep_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_sleep_bounds() {
        let mut settings = Settings::default();
        settings.poll.min_sleep_secs = 1000;
        settings.poll.max_sleep_secs = 700;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [report]
            title = "Trace"
            direction = "Inbound"
            "#,
        )
        .unwrap();
        assert_eq!(settings.report.title, "Trace");
        assert_eq!(settings.report.direction, "Inbound");
        assert_eq!(settings.poll.min_sleep_secs, 700);
        assert_eq!(settings.poll.max_sleep_secs, 1000);
        assert!(settings.browser.headless);
        assert!(settings.poll.max_wait_secs.is_none());
    }
}
