//! Halo - Object detection overlays for videos
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (av, detection, overlay, jobs)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (HTTP inbound, REST, S3, ONNX)
//! - application/: Job processing services
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use config::AppConfig;
