//! Ports - Trait definitions for everything a job talks to.

pub mod annotate;
pub mod dispatch;
pub mod fetch;
pub mod model;
pub mod records;
pub mod storage;
