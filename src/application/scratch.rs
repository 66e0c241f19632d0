use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The pair of temp files a job works with. Both are removed when this is
/// dropped, on every exit path.
#[derive(Debug)]
pub struct ScratchFiles {
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    /// Reserve a uniquely named input file in `dir` and derive the output
    /// name from it (`<stem>_annotated.mp4`).
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        let input = tempfile::Builder::new()
            .prefix("halo-")
            .suffix(".mp4")
            .tempfile_in(dir)?
            .into_temp_path()
            .keep()
            .map_err(|e| e.error)?;
        let output = annotated_path(&input);
        Ok(Self { input, output })
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed temp file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temp file"),
            }
        }
    }
}

fn annotated_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}_annotated.mp4", stem))
}
