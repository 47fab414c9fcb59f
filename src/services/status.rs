//! Status polling stage.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::error::{AppError, Result};
use crate::models::PollSettings;
use crate::services::HistoricalSearchApi;

/// Terminal report status. Every other value, including an unknown one or a
/// listing with no matching entry, counts as still pending.
pub const STATUS_DONE: &str = "Done";

/// Polls the report listing until the tracked job is done.
///
/// The wait between polls is uniformly random within the configured bounds,
/// long and jittered on purpose so the remote service sees no fixed request
/// pattern. Without `poll.max_wait_secs` the loop has no upper bound; the
/// externally paced job finishes when it finishes, and only killing the
/// process stops the wait.
pub struct StatusPoller<'a> {
    api: &'a dyn HistoricalSearchApi,
    poll: &'a PollSettings,
}

impl<'a> StatusPoller<'a> {
    pub fn new(api: &'a dyn HistoricalSearchApi, poll: &'a PollSettings) -> Self {
        Self { api, poll }
    }

    /// Block until the tracked job reports the terminal status.
    pub async fn wait_until_done(&self, job_id: &str) -> Result<()> {
        log::debug!("Job id to check: {job_id}");
        let started = Instant::now();

        loop {
            let listing = self.api.list_reports().await?;
            let status = listing.status_of(job_id).map(str::to_string);

            match status.as_deref() {
                Some(STATUS_DONE) => {
                    log::info!("Report status: {STATUS_DONE}");
                    log::info!("Report is ready to be downloaded.");
                    return Ok(());
                }
                Some(other) => log::debug!("Report status: {other}"),
                None => log::debug!("Job {job_id} not present in the listing yet"),
            }

            self.check_deadline(job_id, started)?;

            let sleep_secs = rand::thread_rng()
                .gen_range(self.poll.min_sleep_secs..=self.poll.max_sleep_secs);
            log::info!("Sleeping for {sleep_secs} seconds...");
            tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
            log::info!("Waking up, checking report status...");
        }
    }

    fn check_deadline(&self, job_id: &str, started: Instant) -> Result<()> {
        let Some(max_wait) = self.poll.max_wait_secs else {
            return Ok(());
        };
        let waited = started.elapsed().as_secs();
        if waited >= max_wait {
            return Err(AppError::PollTimeout {
                job_id: job_id.to_string(),
                waited_secs: waited,
            });
        }
        Ok(())
    }
}
