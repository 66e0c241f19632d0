use halo::adapters::http::router;
use halo::adapters::onnx::load_model;
use halo::adapters::rest::{ensure_model_available, HttpFetcher, RestRecordStore};
use halo::adapters::s3::S3BlobStore;
use halo::application::annotate::FfmpegAnnotator;
use halo::application::dispatcher::TokioDispatcher;
use halo::application::processor::JobProcessor;
use halo::application::publisher::Publisher;
use halo::ports::dispatch::JobDispatcher;
use halo::ports::model::Detector;
use halo::AppConfig;
use std::error::Error;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let client = reqwest::Client::new();

    let model_path = ensure_model_available(
        &client,
        &config.model.public_url,
        &config.model.file_name,
        &config.scratch_dir,
    )
    .await?;
    let detector: Arc<dyn Detector> = Arc::new(load_model(&model_path)?);

    let publisher = Publisher::new(
        S3BlobStore::from_config(&config.blob),
        RestRecordStore::new(client.clone(), &config.database),
        config.blob.public_url.clone(),
    );
    let processor = JobProcessor::new(
        HttpFetcher::new(client),
        FfmpegAnnotator::new(detector),
        publisher,
        config.scratch_dir.clone(),
    );
    let dispatcher: Arc<dyn JobDispatcher> =
        Arc::new(TokioDispatcher::new(processor, config.max_concurrent_jobs));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(
        address = %config.bind_address(),
        max_concurrent_jobs = config.max_concurrent_jobs,
        model_bucket = %config.blob.model_bucket,
        "listening"
    );
    axum::serve(listener, router(dispatcher)).await?;

    Ok(())
}
