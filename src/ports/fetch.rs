use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Download the video at `url` into `dest`, replacing any content there.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, Box<dyn Error + Send + Sync>>;
}
