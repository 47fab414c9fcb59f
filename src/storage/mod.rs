//! Persistence for the tracked report job.
//!
//! One text file under the output directory holds the identifier of the one
//! outstanding job. Every stage re-reads it on entry, so the workflow
//! survives process restarts and each stage can be invoked on its own.

mod job_state;

pub use job_state::JobStateStore;
