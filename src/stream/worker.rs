//! Classifier worker thread: one request in flight at a time, results tagged
//! with the session generation they were submitted under.

use crate::classifier::{ChunkPayload, Classifier};
use crate::log_debug;
use anyhow::Result;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::thread;
use std::time::Instant;

pub(super) struct ChunkJob {
    pub(super) generation: u64,
    pub(super) wav: Vec<u8>,
}

pub(super) struct ChunkResult {
    pub(super) generation: u64,
    pub(super) outcome: Result<ChunkPayload>,
}

/// Outcome of handing a chunk to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Submit {
    Queued,
    Dropped,
    Closed,
}

pub(super) struct ClassifierWorker {
    jobs: Option<Sender<ChunkJob>>,
    results: Receiver<ChunkResult>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ClassifierWorker {
    pub(super) fn spawn<C>(classifier: C, capacity: usize) -> Self
    where
        C: Classifier + Send + 'static,
    {
        let (job_tx, job_rx) = bounded::<ChunkJob>(capacity.max(1));
        let (result_tx, result_rx) = unbounded::<ChunkResult>();
        let handle = thread::spawn(move || run_worker(classifier, job_rx, result_tx));
        Self {
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
        }
    }

    pub(super) fn submit(&self, job: ChunkJob) -> Submit {
        let Some(jobs) = self.jobs.as_ref() else {
            return Submit::Closed;
        };
        match jobs.try_send(job) {
            Ok(()) => Submit::Queued,
            Err(TrySendError::Full(_)) => Submit::Dropped,
            Err(TrySendError::Disconnected(_)) => Submit::Closed,
        }
    }

    pub(super) fn results(&self) -> &Receiver<ChunkResult> {
        &self.results
    }

    /// Close the job queue and let the thread finish on its own. A request
    /// already in flight completes into a channel nobody reads.
    pub(super) fn shutdown(mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

fn run_worker<C: Classifier>(
    classifier: C,
    jobs: Receiver<ChunkJob>,
    results: Sender<ChunkResult>,
) {
    for job in jobs.iter() {
        let started = Instant::now();
        let outcome = classifier.classify_chunk(job.wav);
        if let Err(err) = &outcome {
            log_debug(&format!(
                "classify_chunk failed after {}ms: {err:#}",
                started.elapsed().as_millis()
            ));
        }
        if results
            .send(ChunkResult {
                generation: job.generation,
                outcome,
            })
            .is_err()
        {
            break;
        }
    }
}
