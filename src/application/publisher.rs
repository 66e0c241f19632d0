use crate::domain::jobs::ProcessedRecord;
use crate::ports::records::RecordStore;
use crate::ports::storage::BlobStore;
use std::error::Error;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("output path has no file name: {0}")]
    NoFileName(String),

    #[error("upload of {key} failed")]
    Upload {
        key: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Result of a publish whose upload succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub url: String,
    pub recorded: bool,
}

/// Uploads finished videos and records where they ended up.
pub struct Publisher<S, R> {
    store: S,
    records: R,
    public_base_url: String,
}

impl<S, R> Publisher<S, R>
where
    S: BlobStore,
    R: RecordStore,
{
    pub fn new(store: S, records: R, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            records,
            public_base_url: public_base_url.into(),
        }
    }

    /// Upload `local_path` under its file name, then record the public URL
    /// against `video_id`.
    ///
    /// A refused record write is logged and reported through
    /// `Published::recorded`; only a failed upload is an error.
    pub async fn publish(
        &self,
        local_path: &Path,
        video_id: &str,
    ) -> Result<Published, PublishError> {
        let key = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PublishError::NoFileName(local_path.display().to_string()))?
            .to_string();

        self.store
            .upload(local_path, &key, VIDEO_CONTENT_TYPE)
            .await
            .map_err(|source| PublishError::Upload {
                key: key.clone(),
                source,
            })?;

        let url = public_url(&self.public_base_url, &key);
        info!(video_id, url = %url, "upload complete");

        let record = ProcessedRecord {
            original_video_id: video_id.to_string(),
            processed_url: url.clone(),
        };
        let recorded = match self.records.insert(&record).await {
            Ok(()) => {
                info!(video_id, "record stored");
                true
            }
            Err(e) => {
                error!(
                    video_id,
                    url = %url,
                    error = %e,
                    "failed to store record, uploaded video is unreferenced"
                );
                false
            }
        };

        Ok(Published { url, recorded })
    }
}

/// `base` and `key` joined by exactly one `/`.
pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::records::MockRecordStore;
    use crate::ports::storage::MockBlobStore;
    use std::path::PathBuf;

    const BASE: &str = "https://cdn.example.com";

    #[test]
    fn test_public_url_joins_with_single_slash() {
        assert_eq!(public_url(BASE, "a.mp4"), "https://cdn.example.com/a.mp4");
        assert_eq!(
            public_url("https://cdn.example.com/", "a.mp4"),
            "https://cdn.example.com/a.mp4"
        );
    }

    #[tokio::test]
    async fn test_uploads_as_mp4_then_records_url() {
        let mut store = MockBlobStore::new();
        store
            .expect_upload()
            .withf(|path, key, content_type| {
                path == Path::new("/scratch/halo-1_annotated.mp4")
                    && key == "halo-1_annotated.mp4"
                    && content_type == "video/mp4"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut records = MockRecordStore::new();
        records
            .expect_insert()
            .withf(|record| {
                record.original_video_id == "vid-7"
                    && record.processed_url == "https://cdn.example.com/halo-1_annotated.mp4"
            })
            .times(1)
            .returning(|_| Ok(()));

        let publisher = Publisher::new(store, records, BASE);
        let published = publisher
            .publish(&PathBuf::from("/scratch/halo-1_annotated.mp4"), "vid-7")
            .await
            .unwrap();

        assert_eq!(
            published,
            Published {
                url: "https://cdn.example.com/halo-1_annotated.mp4".to_string(),
                recorded: true,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_upload_skips_record() {
        let mut store = MockBlobStore::new();
        store
            .expect_upload()
            .times(1)
            .returning(|_, _, _| Err("access denied".into()));
        let mut records = MockRecordStore::new();
        records.expect_insert().never();

        let publisher = Publisher::new(store, records, BASE);
        let err = publisher
            .publish(Path::new("/scratch/x_annotated.mp4"), "vid")
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Upload { ref key, .. } if key == "x_annotated.mp4"));
    }

    #[tokio::test]
    async fn test_failed_record_is_not_an_error() {
        let mut store = MockBlobStore::new();
        store.expect_upload().times(1).returning(|_, _, _| Ok(()));
        let mut records = MockRecordStore::new();
        records
            .expect_insert()
            .times(1)
            .returning(|_| Err("409 conflict".into()));

        let publisher = Publisher::new(store, records, BASE);
        let published = publisher
            .publish(Path::new("/scratch/x_annotated.mp4"), "vid")
            .await
            .unwrap();

        assert!(!published.recorded);
        assert_eq!(published.url, "https://cdn.example.com/x_annotated.mp4");
    }
}
