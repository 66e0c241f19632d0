//! Domain layer - Pure business logic.

// Frame decoding and encoding (ffmpeg-next)
pub mod av;

// Detection decoding and rendering
pub mod detection;
pub mod overlay;

// Job definitions
pub mod jobs;
