//! Outbound HTTP adapters built on `reqwest`.

pub mod download;
pub mod model_loader;
pub mod records;

pub use download::HttpFetcher;
pub use model_loader::ensure_model_available;
pub use records::RestRecordStore;
