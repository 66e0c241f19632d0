use super::publisher::{PublishError, Publisher};
use super::scratch::ScratchFiles;
use crate::domain::jobs::{Job, JobOutcome};
use crate::ports::annotate::VideoAnnotator;
use crate::ports::fetch::VideoFetcher;
use crate::ports::records::RecordStore;
use crate::ports::storage::BlobStore;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to create temp files")]
    Scratch(#[source] std::io::Error),

    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("annotation failed")]
    Annotate(#[source] Box<dyn Error + Send + Sync>),

    #[error("annotation task aborted")]
    Aborted(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Runs one job end to end: fetch → annotate → publish.
pub struct JobProcessor<F, A, S, R> {
    fetcher: F,
    annotator: Arc<A>,
    publisher: Publisher<S, R>,
    scratch_dir: PathBuf,
}

impl<F, A, S, R> JobProcessor<F, A, S, R>
where
    F: VideoFetcher,
    A: VideoAnnotator + 'static,
    S: BlobStore,
    R: RecordStore,
{
    pub fn new(
        fetcher: F,
        annotator: A,
        publisher: Publisher<S, R>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            annotator: Arc::new(annotator),
            publisher,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Process `job`. Temp files are gone by the time this returns, whatever
    /// the result.
    pub async fn process(&self, job: &Job) -> Result<JobOutcome, JobError> {
        info!(video_id = %job.video_id, "starting video processing");

        // 1. Prepare Paths
        let scratch = ScratchFiles::create_in(&self.scratch_dir).map_err(JobError::Scratch)?;

        // 2. Download
        let bytes = self
            .fetcher
            .fetch(&job.video_url, scratch.input())
            .await
            .map_err(|source| JobError::Fetch {
                url: job.video_url.clone(),
                source,
            })?;
        info!(video_id = %job.video_id, bytes, "downloaded input video");

        // 3. Annotate
        let annotator = self.annotator.clone();
        let (input, output) = (scratch.input().to_path_buf(), scratch.output().to_path_buf());
        let stats = tokio::task::spawn_blocking(move || annotator.annotate(&input, &output))
            .await?
            .map_err(JobError::Annotate)?;
        info!(
            video_id = %job.video_id,
            frames = stats.frames,
            width = stats.width,
            height = stats.height,
            fps = stats.fps,
            "processed frames, uploading"
        );

        // 4. Upload and record
        let published = self.publisher.publish(scratch.output(), &job.video_id).await?;

        let outcome = if published.recorded {
            JobOutcome::Recorded {
                processed_url: published.url,
                frames: stats.frames,
            }
        } else {
            JobOutcome::Unrecorded {
                processed_url: published.url,
                frames: stats.frames,
            }
        };
        Ok(outcome)
    }
}
