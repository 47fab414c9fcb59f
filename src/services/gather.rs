//! Artifact collection stage.
//!
//! The download endpoint only serves the finished report inside a logged-in
//! browser context, so this stage drives a real browser: sign in through the
//! identity provider, point the session at the download URL, and keep
//! re-requesting it until the file shows up in the download directory.

use std::path::Path;
use std::time::{Duration, Instant};

use thirtyfour::common::capabilities::firefox::FirefoxPreferences;
use thirtyfour::prelude::*;

use crate::error::{AppError, Result};
use crate::models::{BrowserSettings, Credentials, PollSettings};

/// Identity provider sign-in page.
const SIGNIN_URL: &str = "https://login.windows.net";

/// Download endpoint; the job id goes in the request id parameter.
const DOWNLOAD_URL: &str =
    "https://admin.protection.outlook.com/ExtendedReport/Download?Type=OnDemandReport&RequestID=";

/// Content types the browser saves to disk without prompting.
const AUTOSAVE_CONTENT_TYPES: &str =
    "text/plain, text/html, application/xhtml+xml, application/xml";

// Sign-in page element ids.
const EMAIL_FIELD: &str = "i0116";
const PASSWORD_FIELD: &str = "i0118";
const NEXT_BUTTON: &str = "idSIButton9";

/// Poll interval for element waits.
const ELEMENT_POLL: Duration = Duration::from_millis(500);

/// Position in the sign-in flow. The persist prompt is best-effort; the
/// provider only sometimes shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignInStep {
    AwaitingEmail,
    AwaitingPassword,
    AwaitingPersistPrompt,
    Authenticated,
}

/// Collects the finished report through an authenticated browser session.
pub struct ArtifactRetriever<'a> {
    credentials: &'a Credentials,
    browser: &'a BrowserSettings,
    poll: &'a PollSettings,
}

impl<'a> ArtifactRetriever<'a> {
    pub fn new(
        credentials: &'a Credentials,
        browser: &'a BrowserSettings,
        poll: &'a PollSettings,
    ) -> Self {
        Self {
            credentials,
            browser,
            poll,
        }
    }

    /// Download the artifact for `job_id` into `download_dir`.
    ///
    /// Session setup, sign-in, or navigation failures all collapse to
    /// `false`. The browser session is torn down on every path; teardown
    /// failures never change the outcome already decided by the loop.
    pub async fn download_artifact(&self, job_id: &str, download_dir: &Path) -> bool {
        let driver = match self.start_session(download_dir).await {
            Ok(driver) => driver,
            Err(e) => {
                log::warn!("Could not start browser session: {e}");
                return false;
            }
        };

        let outcome = self.sign_in_and_collect(&driver, job_id, download_dir).await;

        if let Err(e) = driver.quit().await {
            log::debug!("Browser teardown failed: {e}");
        }

        match outcome {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Report download failed: {e}");
                false
            }
        }
    }

    /// Start a session configured to save report downloads unprompted.
    async fn start_session(&self, download_dir: &Path) -> Result<WebDriver> {
        let mut prefs = FirefoxPreferences::new();
        prefs.set("browser.preferences.instantApply", true)?;
        prefs.set("browser.download.folderList", 2)?;
        prefs.set("browser.download.manager.showWhenStarting", false)?;
        prefs.set("browser.helperApps.alwaysAsk.force", false)?;
        prefs.set("browser.download.dir", download_dir.to_string_lossy().as_ref())?;
        prefs.set("browser.helperApps.neverAsk.saveToDisk", AUTOSAVE_CONTENT_TYPES)?;

        let mut caps = DesiredCapabilities::firefox();
        caps.set_preferences(prefs)?;
        if self.browser.headless {
            caps.set_headless()?;
        }

        Ok(WebDriver::new(&self.browser.webdriver_url, caps).await?)
    }

    async fn sign_in_and_collect(
        &self,
        driver: &WebDriver,
        job_id: &str,
        download_dir: &Path,
    ) -> Result<()> {
        driver.goto(SIGNIN_URL).await?;
        self.sign_in(driver).await?;
        self.collect(driver, job_id, download_dir).await
    }

    /// Walk the sign-in states in order. Email and password are hard waits;
    /// the persist prompt silently times out when absent.
    async fn sign_in(&self, driver: &WebDriver) -> Result<()> {
        let element_timeout = Duration::from_secs(self.browser.element_timeout_secs);
        let prompt_timeout = Duration::from_secs(self.browser.persist_prompt_timeout_secs);

        let mut step = SignInStep::AwaitingEmail;
        while step != SignInStep::Authenticated {
            step = match step {
                SignInStep::AwaitingEmail => {
                    let field = wait_for(driver, By::Id(EMAIL_FIELD), element_timeout).await?;
                    field.send_keys(&self.credentials.username).await?;
                    wait_for(driver, By::Id(NEXT_BUTTON), element_timeout)
                        .await?
                        .click()
                        .await?;
                    SignInStep::AwaitingPassword
                }
                SignInStep::AwaitingPassword => {
                    let field = wait_for(driver, By::Id(PASSWORD_FIELD), element_timeout).await?;
                    field.send_keys(&self.credentials.password).await?;
                    wait_for(driver, By::Id(NEXT_BUTTON), element_timeout)
                        .await?
                        .click()
                        .await?;
                    SignInStep::AwaitingPersistPrompt
                }
                SignInStep::AwaitingPersistPrompt => {
                    match wait_for(driver, By::Id(NEXT_BUTTON), prompt_timeout).await {
                        Ok(button) => {
                            let _ = button.click().await;
                        }
                        Err(_) => log::debug!("Stay signed in prompt did not appear"),
                    }
                    SignInStep::Authenticated
                }
                SignInStep::Authenticated => SignInStep::Authenticated,
            };
        }
        Ok(())
    }

    /// Keep requesting the download URL until a file named after the job
    /// shows up. Unbounded by default, the same documented property as the
    /// status poll; bounded when `poll.max_wait_secs` is set.
    async fn collect(&self, driver: &WebDriver, job_id: &str, download_dir: &Path) -> Result<()> {
        let url = format!("{DOWNLOAD_URL}{job_id}");
        let recheck = Duration::from_secs(self.poll.download_recheck_secs);
        let started = Instant::now();

        driver.goto(&url).await?;
        loop {
            log::info!("Sleeping for {} seconds...", recheck.as_secs());
            tokio::time::sleep(recheck).await;

            if dir_contains_job_file(download_dir, job_id).await? {
                log::info!(
                    "Report for job {job_id} arrived in {}",
                    download_dir.display()
                );
                let _ = driver.close_window().await;
                return Ok(());
            }

            if let Some(max_wait) = self.poll.max_wait_secs {
                let waited = started.elapsed().as_secs();
                if waited >= max_wait {
                    return Err(AppError::PollTimeout {
                        job_id: job_id.to_string(),
                        waited_secs: waited,
                    });
                }
            }

            log::info!("Attempting to download file again...");
            driver.goto(&url).await?;
        }
    }
}

/// Wait until the element is present, polling every half second.
async fn wait_for(driver: &WebDriver, by: By, timeout: Duration) -> Result<WebElement> {
    Ok(driver.query(by).wait(timeout, ELEMENT_POLL).first().await?)
}

/// True when any entry of `dir` has the job id in its file name.
async fn dir_contains_job_file(dir: &Path, job_id: &str) -> Result<bool> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().contains(job_id) {
            return Ok(true);
        }
    }
    Ok(false)
}
