//! Background execution of an analysis.
//!
//! A job runs ingestion and the ANOVA on its own thread and reports exactly
//! one completion result over a channel, so a caller can keep an interactive
//! surface alive while it waits.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::anova::{compute_anova, parse_alpha, AnovaReport};
use crate::error::{AnovaError, Result};
use crate::ingest::ingest;
use crate::types::RawTable;

/// Everything needed to run one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub table: RawTable,
    pub has_header: bool,
    pub has_index: bool,
    /// Significance level as entered; see [`parse_alpha`].
    pub alpha: Option<String>,
}

/// Runs a job synchronously on the calling thread.
pub fn run_analysis(job: &AnalysisJob) -> Result<AnovaReport> {
    let alpha = parse_alpha(job.alpha.as_deref());
    let groups = ingest(&job.table, job.has_header, job.has_index)?;
    compute_anova(&groups, alpha)
}

/// Handle to a job running on a worker thread.
#[derive(Debug)]
pub struct AnalysisHandle {
    receiver: Receiver<Result<AnovaReport>>,
    thread: Option<JoinHandle<()>>,
}

/// Starts `job` on a new worker thread.
pub fn spawn_analysis(job: AnalysisJob) -> AnalysisHandle {
    let (sender, receiver) = mpsc::channel();
    let thread = thread::spawn(move || {
        // The receiver may already be gone; nothing is waiting then.
        let _ = sender.send(run_analysis(&job));
    });
    AnalysisHandle {
        receiver,
        thread: Some(thread),
    }
}

impl AnalysisHandle {
    /// Waits up to `timeout` for the result.
    ///
    /// `None` means the job is still running.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Result<AnovaReport>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.join();
                Some(Err(worker_stopped()))
            }
        }
    }

    /// Blocks until the job completes.
    pub fn wait(mut self) -> Result<AnovaReport> {
        let result = self.receiver.recv().unwrap_or_else(|_| Err(worker_stopped()));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_stopped() -> AnovaError {
    AnovaError::computation("analysis worker stopped without a result")
}
