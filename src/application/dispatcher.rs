use super::processor::JobProcessor;
use crate::domain::jobs::{Job, JobOutcome};
use crate::ports::annotate::VideoAnnotator;
use crate::ports::dispatch::JobDispatcher;
use crate::ports::fetch::VideoFetcher;
use crate::ports::records::RecordStore;
use crate::ports::storage::BlobStore;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn, Instrument};

/// Spawns every job as its own tokio task. Jobs beyond the concurrency limit
/// wait for a permit inside their task, so dispatching never blocks.
pub struct TokioDispatcher<F, A, S, R> {
    processor: Arc<JobProcessor<F, A, S, R>>,
    permits: Arc<Semaphore>,
}

impl<F, A, S, R> TokioDispatcher<F, A, S, R> {
    pub fn new(processor: JobProcessor<F, A, S, R>, max_concurrent_jobs: usize) -> Self {
        Self {
            processor: Arc::new(processor),
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }
}

impl<F, A, S, R> JobDispatcher for TokioDispatcher<F, A, S, R>
where
    F: VideoFetcher + 'static,
    A: VideoAnnotator + 'static,
    S: BlobStore + 'static,
    R: RecordStore + 'static,
{
    fn dispatch(&self, job: Job) {
        let processor = self.processor.clone();
        let permits = self.permits.clone();
        let span = tracing::info_span!("job", video_id = %job.video_id);

        tokio::spawn(
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    warn!("job queue closed, dropping job");
                    return;
                };
                match processor.process(&job).await {
                    Ok(JobOutcome::Recorded { processed_url, frames }) => {
                        info!(%processed_url, frames, "job succeeded")
                    }
                    Ok(JobOutcome::Unrecorded { processed_url, frames }) => {
                        warn!(%processed_url, frames, "job ended without a database record")
                    }
                    Err(e) => error!(error = %error_chain(&e), "error during video processing"),
                }
            }
            .instrument(span),
        );
    }
}

/// `error: cause: cause ...` for logging.
pub fn error_chain(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
