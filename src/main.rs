//! msgtrace CLI
//!
//! Submits, tracks, and collects historical message trace reports from the
//! Exchange admin service. Each subcommand resumes from the persisted job
//! state, so the stages can run days apart and across process restarts.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use msgtrace::{
    error::{AppError, Result},
    models::{AuthContext, Settings},
    services::{ArtifactRetriever, ExchangeAdminClient, ReportSubmitter, StatusPoller},
    storage::JobStateStore,
};

/// Subdirectory of the output directory receiving browser downloads.
const DOWNLOAD_SUBDIR: &str = "msgtrc";

/// msgtrace - Historical message trace report automation
#[derive(Parser, Debug)]
#[command(
    name = "msgtrace",
    version,
    about = "Historical message trace report automation"
)]
struct Cli {
    /// Path to the TOML settings file
    #[arg(short, long, default_value = "msgtrace.toml")]
    config: PathBuf,

    /// File holding the session cookie and validation token
    #[arg(short, long, default_value = ".ugt_auth")]
    authfile: PathBuf,

    /// Output directory for job state and downloaded reports
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a message trace report request
    Submit {
        /// Keep polling until the report is done after submitting
        #[arg(long)]
        full: bool,
    },

    /// Wait until the tracked report is done
    CheckStatus {
        /// Job id to track instead of the persisted one
        #[arg(long)]
        job_id: Option<String>,
    },

    /// Sign in through the browser and download the finished report
    GatherReport {
        /// Job id to collect instead of the persisted one
        #[arg(long)]
        job_id: Option<String>,

        /// Show the browser window instead of running headless
        #[arg(long)]
        interactive: bool,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Read the session bundle, refusing clearly when the auth step was skipped.
async fn load_auth(path: &Path) -> Result<AuthContext> {
    if !path.is_file() {
        log::warn!("{} auth file missing. Please auth first.", path.display());
        return Err(AppError::auth("auth file missing"));
    }
    log::info!("Reading in authfile: {}", path.display());
    AuthContext::load(path).await
}

/// Resolve the tracked job id: explicit flag first, then the state file.
async fn resolve_job_id(store: &JobStateStore, explicit: Option<String>) -> Result<String> {
    if let Some(id) = explicit {
        return Ok(id);
    }
    match store.load().await? {
        Some(id) => Ok(id),
        None => {
            log::warn!(
                "No job id found in {}. Submit a report first or place a job id there.",
                store.path().display()
            );
            Err(AppError::config("no tracked job id"))
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        log::error!("{e}");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load_or_default(&cli.config);
    settings.validate()?;

    let download_dir = cli.output_dir.join(DOWNLOAD_SUBDIR);
    tokio::fs::create_dir_all(&download_dir).await?;

    let store = JobStateStore::new(&cli.output_dir);
    let started = Instant::now();

    match cli.command {
        Command::Submit { full } => {
            let auth = load_auth(&cli.authfile).await?;
            let client = ExchangeAdminClient::new(auth)?;

            log::info!("Requesting message trace...");
            let job_id = ReportSubmitter::new(&client, &store)
                .submit(&settings.report)
                .await?;

            if full {
                StatusPoller::new(&client, &settings.poll)
                    .wait_until_done(&job_id)
                    .await?;
            }

            log::info!(
                "Message trace request executed in {:.2} seconds.",
                started.elapsed().as_secs_f64()
            );
        }

        Command::CheckStatus { job_id } => {
            let auth = load_auth(&cli.authfile).await?;
            let client = ExchangeAdminClient::new(auth)?;
            let job_id = resolve_job_id(&store, job_id).await?;

            log::info!("Checking message trace report status...");
            StatusPoller::new(&client, &settings.poll)
                .wait_until_done(&job_id)
                .await?;

            log::info!(
                "Message trace status check executed in {:.2} seconds.",
                started.elapsed().as_secs_f64()
            );
        }

        Command::GatherReport {
            job_id,
            interactive,
        } => {
            let job_id = resolve_job_id(&store, job_id).await?;

            if settings.auth.username.is_empty() || settings.auth.password.is_empty() {
                log::warn!("auth.username and auth.password must be set to sign in.");
                return Err(AppError::config("missing sign-in credentials"));
            }

            let mut browser = settings.browser.clone();
            if interactive {
                browser.headless = false;
            }

            log::info!("Exporting completed message trace report...");
            let retriever = ArtifactRetriever::new(&settings.auth, &browser, &settings.poll);
            if retriever.download_artifact(&job_id, &download_dir).await {
                log::info!("Report downloaded to {}", download_dir.display());
            } else {
                log::warn!("Report download did not complete.");
            }

            log::info!(
                "Message trace download executed in {:.2} seconds.",
                started.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}
