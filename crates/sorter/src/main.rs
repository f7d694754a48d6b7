use anyhow::Context;
use clap::{Parser, Subcommand};
use common::TelemetryGuard;
use preprocess::Image;
use serde::Serialize;
use sorter::{
    CategoryResult, ClassificationPipeline, DirAssetStore, DisplayLabel, ModelDetector,
    ModelRegistry, ModelSpec, PipelineConfig, Scoreboard, SorterConfig, StatsSnapshot,
    logging::setup_logging, pipeline::RegionSource,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "ort-backend")]
use sorter::backend::ort::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The `wastesort` binary needs the 'ort-backend' feature");

/// Classify photos of waste into sorting bins.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect, crop and classify a single image file
    Classify {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Skip the object detector and classify the centered fallback region
        #[arg(long)]
        no_detect: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Report<'a> {
    result: &'a CategoryResult,
    stats: StatsSnapshot,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = SorterConfig::from_env()?;

    let _telemetry = match &config.otlp_endpoint {
        Some(endpoint) => Some(TelemetryGuard::init("wastesort", endpoint, config.environment)?),
        None => {
            setup_logging(&config);
            None
        }
    };

    tracing::info!(config = ?config, "Loaded configuration");

    match args.command {
        Command::Classify {
            image,
            no_detect,
            json,
        } => classify(&config, &image, !no_detect, json).await,
    }
}

async fn classify(
    config: &SorterConfig,
    path: &Path,
    detect: bool,
    json: bool,
) -> anyhow::Result<()> {
    let rgb = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgb8();
    let image = Image::try_from(rgb)
        .with_context(|| format!("Decoded image {} is empty", path.display()))?;

    let store = Arc::new(DirAssetStore::new(&config.model_dir));
    tracing::debug!(model_dir = %store.root().display(), "Using model directory");
    let registry = Arc::new(ModelRegistry::<Backend>::with_options(
        store,
        config.execution_provider,
    ));
    let scoreboard = Arc::new(Scoreboard::new(config.points_per_item));

    let mut pipeline = ClassificationPipeline::new(
        Arc::clone(&registry),
        config.classifier.spec(),
        PipelineConfig::from(config),
    )
    .with_score_sink(scoreboard.clone());

    if detect && config.detector_enabled {
        pipeline = pipeline.with_detector(ModelDetector::new(
            Arc::clone(&registry),
            ModelSpec::yolo_detector(),
        ));
    }

    let result = Arc::new(pipeline)
        .analyze_async(image, config.inference_timeout)
        .await;
    registry.release();

    let stats = scoreboard.snapshot();
    if json {
        let report = Report {
            result: &result,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_result(&result, &stats);
    }

    Ok(())
}

fn print_result(result: &CategoryResult, stats: &StatsSnapshot) {
    match &result.display {
        DisplayLabel::Determined(title) => println!("Category:    {} ({})", title, result.category),
        DisplayLabel::Undetermined => println!("Category:    undetermined ({})", result.category),
    }
    println!("Confidence:  {:.0}%", result.confidence * 100.0);
    if let Some(label) = &result.raw_label {
        println!("Model label: {}", label);
    }
    if let Some(region) = &result.region {
        let source = match region.source {
            RegionSource::Detected { score } => format!("detected ({:.2})", score),
            RegionSource::Fallback => "fallback".to_string(),
            RegionSource::FullImage => "full image".to_string(),
        };
        println!(
            "Region:      {} [{:.2}, {:.2}, {:.2}, {:.2}]",
            source, region.left, region.top, region.right, region.bottom
        );
    }
    if result.is_determined() {
        println!("About:       {}", result.info.description);
        println!("Examples:    {}", result.info.examples.join(", "));
        println!("Instructions:");
        for step in result.info.instructions {
            println!("  - {}", step);
        }
    }
    println!("Points:      {}", stats.total_points);
}
