use crate::ports::fetch::VideoFetcher;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::BoxError;
use futures::{Stream, TryStreamExt};
use std::error::Error;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Save a `Stream` of body chunks to `path`, truncating whatever was there.
/// Returns the number of bytes written.
pub async fn stream_to_file<S, E>(path: &Path, stream: S) -> io::Result<u64>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);

    let mut file = BufWriter::new(File::create(path).await?);
    let written = tokio::io::copy(&mut body_reader, &mut file).await?;
    file.flush().await?;

    Ok(written)
}

/// Downloads input videos over plain HTTP(S).
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, Box<dyn Error + Send + Sync>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        debug!(url, status = %response.status(), "downloading");

        let written = stream_to_file(dest, response.bytes_stream()).await?;
        Ok(written)
    }
}
