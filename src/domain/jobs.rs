use serde::Serialize;

/// A request to annotate the video at `video_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub video_url: String,
    pub video_id: String,
}

impl Job {
    /// Build a job from the raw request fields. Both must be present and non-empty.
    pub fn from_fields(video_url: Option<String>, video_id: Option<String>) -> Option<Self> {
        match (video_url, video_id) {
            (Some(video_url), Some(video_id)) if !video_url.is_empty() && !video_id.is_empty() => {
                Some(Self {
                    video_url,
                    video_id,
                })
            }
            _ => None,
        }
    }
}

/// Row written to the database once a processed video is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedRecord {
    pub original_video_id: String,
    pub processed_url: String,
}

/// How a job that got as far as uploading ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Video uploaded and its URL recorded.
    Recorded { processed_url: String, frames: usize },
    /// Video uploaded but the database write was refused; the blob is orphaned.
    Unrecorded { processed_url: String, frames: usize },
}
