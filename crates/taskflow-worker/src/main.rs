//! Event-aware video segmentation binary.

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskflow_worker::{build_detector, Cli, TaskFlowPipeline, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("taskflow=info,taskflow_media=info,taskflow_worker=info"))
        .add_directive("ort=warn".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();
    let config = cli.apply(WorkerConfig::from_env());
    config.validate().context("invalid configuration")?;
    info!("Worker config: {:?}", config);

    let detector = build_detector(&config).context("failed to initialize object detector")?;
    let pipeline = TaskFlowPipeline::new(config, detector);

    let report = pipeline
        .run(&cli.video)
        .await
        .with_context(|| format!("failed to process {}", cli.video.display()))?;

    if let Some(error) = &report.manifest.decode_error {
        warn!("Video was only partially decoded: {}", error);
    }
    for failure in &report.manifest.failures {
        warn!(index = failure.index, "Clip {} failed: {}", failure.index, failure.message);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.manifest)?);
    } else {
        println!("{}", report.manifest_path.display());
    }

    Ok(())
}
