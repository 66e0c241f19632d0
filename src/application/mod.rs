//! Application layer - Services that drive a job through the ports.

pub mod annotate;
pub mod dispatcher;
pub mod processor;
pub mod publisher;
pub mod scratch;
