use super::download::stream_to_file;
use reqwest::StatusCode;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ModelDownloadError {
    #[error("failed to request model from {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("model download from {url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to write model to {path}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Make sure the model artifact `file_name` exists in `dir`, downloading it
/// from `base_url` when it does not.
///
/// An existing file is trusted as-is. A download lands in `<file>.part` first
/// and is renamed once complete.
pub async fn ensure_model_available(
    client: &reqwest::Client,
    base_url: &str,
    file_name: &str,
    dir: &Path,
) -> Result<PathBuf, ModelDownloadError> {
    let path = dir.join(file_name);
    if tokio::fs::metadata(&path).await.is_ok() {
        info!(path = %path.display(), "model already present, skipping download");
        return Ok(path);
    }

    let url = format!("{}/{}", base_url.trim_end_matches('/'), file_name);
    info!(url = %url, "downloading model");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| ModelDownloadError::Request {
            url: url.clone(),
            source,
        })?;
    if response.status() != StatusCode::OK {
        return Err(ModelDownloadError::Status {
            url,
            status: response.status(),
        });
    }

    let partial = path.with_file_name(format!("{}.part", file_name));
    let write_error = |source| ModelDownloadError::Write {
        path: path.display().to_string(),
        source,
    };
    let written = match stream_to_file(&partial, response.bytes_stream()).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_error(e));
        }
    };
    tokio::fs::rename(&partial, &path).await.map_err(write_error)?;

    info!(path = %path.display(), bytes = written, "model downloaded");
    Ok(path)
}
