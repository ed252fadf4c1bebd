// Batch application of independent patch jobs.
//
// Jobs share nothing: each one owns its buffers for the duration of its own
// `apply_file` call. With the `parallel` feature the jobs run on the rayon
// global pool; results always come back in job order.

use std::path::PathBuf;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::engine::PatchOptions;
use crate::error::PatchError;
use crate::io::{ApplyStats, apply_file};

/// One old + patch -> new application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchJob {
    pub old: PathBuf,
    pub patch: PathBuf,
    pub new: PathBuf,
}

impl PatchJob {
    pub fn new(old: impl Into<PathBuf>, patch: impl Into<PathBuf>, new: impl Into<PathBuf>) -> Self {
        Self {
            old: old.into(),
            patch: patch.into(),
            new: new.into(),
        }
    }

    pub fn run(&self, opts: &PatchOptions) -> Result<ApplyStats, PatchError> {
        apply_file(&self.old, &self.patch, &self.new, opts)
    }
}

/// Apply every job one after another.
pub fn apply_sequential(
    jobs: &[PatchJob],
    opts: &PatchOptions,
) -> Vec<Result<ApplyStats, PatchError>> {
    jobs.iter().map(|job| job.run(opts)).collect()
}

/// Apply every job, in parallel when the `parallel` feature is enabled.
pub fn apply_all(jobs: &[PatchJob], opts: &PatchOptions) -> Vec<Result<ApplyStats, PatchError>> {
    #[cfg(feature = "parallel")]
    {
        jobs.par_iter().map(|job| job.run(opts)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        apply_sequential(jobs, opts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
