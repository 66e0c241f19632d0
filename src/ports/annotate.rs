use std::error::Error;
use std::path::Path;

/// Summary of one annotation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotateStats {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Turns an input video into an annotated output video. Blocking.
#[cfg_attr(test, mockall::automock)]
pub trait VideoAnnotator: Send + Sync {
    fn annotate(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<AnnotateStats, Box<dyn Error + Send + Sync>>;
}
