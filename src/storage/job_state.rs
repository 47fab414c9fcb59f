//! Single-slot job identifier persistence.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Name of the state file under the output directory.
const STATE_FILE: &str = ".msgtrace_info";

/// Persists the identifier of the one tracked job to local disk.
///
/// `save` overwrites unconditionally. There is no locking; the tool is
/// operator-driven and invoked by one user at a time.
#[derive(Debug, Clone)]
pub struct JobStateStore {
    path: PathBuf,
}

impl JobStateStore {
    /// Create a store rooted at the given output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            path: output_dir.as_ref().join(STATE_FILE),
        }
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `job_id` as the tracked job, replacing any previous one.
    pub async fn save(&self, job_id: &str) -> Result<()> {
        tokio::fs::write(&self.path, format!("{job_id}\n")).await?;
        Ok(())
    }

    /// Read back the tracked job id, or `None` if no job was recorded.
    pub async fn load(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let id = content.lines().next().unwrap_or("").trim();
                if id.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(id.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
