//! Parallel execution of independent portfolio runs.
//!
//! Each job borrows its input read-only, so many jobs can share one set of
//! loaded histories. Jobs run on a dedicated rayon pool sized by the caller.

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use portlab_core::error::EngineError;

use crate::config::PortfolioConfig;
use crate::result::PortfolioResult;
use crate::runner::{run_portfolio, PortfolioInput};

/// One run in a batch.
#[derive(Debug, Clone)]
pub struct BatchJob<'a> {
    /// Caller's name for the job, echoed back in logs.
    pub label: String,
    pub input: &'a PortfolioInput,
    pub config: PortfolioConfig,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("failed to build thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Run every job on a pool of `workers` threads.
///
/// Returns one result per job, in input order. A failing job does not stop
/// the others.
pub fn run_batch(
    jobs: &[BatchJob<'_>],
    workers: usize,
) -> Result<Vec<Result<PortfolioResult, EngineError>>, BatchError> {
    run_batch_with_progress(jobs, workers, |_, _, _| {})
}

/// [`run_batch`] with a callback invoked as each job finishes.
///
/// The callback receives the job index, the total job count and the job's
/// outcome. It may be called from any worker thread and in any order.
pub fn run_batch_with_progress<F>(
    jobs: &[BatchJob<'_>],
    workers: usize,
    progress_callback: F,
) -> Result<Vec<Result<PortfolioResult, EngineError>>, BatchError>
where
    F: Fn(usize, usize, &Result<PortfolioResult, EngineError>) + Send + Sync,
{
    if workers == 0 {
        return Err(BatchError::NoWorkers);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("portlab-batch-{i}"))
        .build()?;

    let total = jobs.len();
    let results = pool.install(|| {
        jobs.par_iter()
            .enumerate()
            .map(|(idx, job)| {
                let outcome = run_portfolio(job.input, &job.config);
                debug!(job = %job.label, ok = outcome.is_ok(), "batch job finished");
                progress_callback(idx, total, &outcome);
                outcome
            })
            .collect()
    });

    Ok(results)
}
