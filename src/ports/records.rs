use crate::domain::jobs::ProcessedRecord;
use async_trait::async_trait;
use std::error::Error;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one record. Any refusal by the store is an error.
    async fn insert(&self, record: &ProcessedRecord) -> Result<(), Box<dyn Error + Send + Sync>>;
}
