//! Adapters - Concrete implementations of ports.

pub mod http;
pub mod onnx;
pub mod rest;
pub mod s3;
