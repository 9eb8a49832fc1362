use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use greenreach_cli::export::{
    degenerate_collection, paths_collection, write_classes_csv, write_distances_csv,
    write_feature_collection, write_report, RunReport,
};
use greenreach_cli::input::{load_network, load_samples};
use greenreach_cli::Config;
use greenreach_core::run_classification;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Road network GeoJSON (planar coordinates)
    #[arg(long)]
    network: PathBuf,

    /// Samples CSV: id,x,y,overlap,entry_x,entry_y,target_x,target_y
    #[arg(long)]
    samples: PathBuf,

    /// Upper bound (inclusive) of tier B, overrides GREENREACH_NEAR_M
    #[arg(long)]
    near: Option<f64>,

    /// Upper bound (inclusive) of tier C, overrides GREENREACH_MODERATE_M
    #[arg(long)]
    moderate: Option<f64>,

    /// Node key precision in coordinate units, overrides GREENREACH_PRECISION
    #[arg(long)]
    precision: Option<f64>,

    /// Skip building path geometry
    #[arg(long)]
    no_paths: bool,

    /// Split MultiLineString roads into their parts instead of rejecting them
    #[arg(long)]
    explode_multi: bool,

    /// Per-sample distance debug table
    #[arg(long)]
    distances_csv: Option<PathBuf>,

    /// Shortest paths as GeoJSON line strings
    #[arg(long)]
    paths_geojson: Option<PathBuf>,

    /// Zero-distance cases as entry-to-target GeoJSON lines
    #[arg(long)]
    degenerate_geojson: Option<PathBuf>,

    /// Final class per sample
    #[arg(long)]
    classes_csv: Option<PathBuf>,

    /// Counters for the run as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("greenreach=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let started_at = Utc::now();

    let mut config = Config::from_env();
    if let Some(near) = args.near {
        config.near_threshold_m = near;
    }
    if let Some(moderate) = args.moderate {
        config.moderate_threshold_m = moderate;
    }
    if let Some(precision) = args.precision {
        config.coordinate_precision = precision;
    }
    if args.no_paths {
        config.export_paths = false;
    }
    tracing::info!(?config, "starting classification");

    let network_file = File::open(&args.network)
        .with_context(|| format!("failed to open {}", args.network.display()))?;
    let geometries = load_network(BufReader::new(network_file), args.explode_multi)?;

    let samples_file = File::open(&args.samples)
        .with_context(|| format!("failed to open {}", args.samples.display()))?;
    let samples = load_samples(BufReader::new(samples_file))?;
    tracing::info!(
        geometries = geometries.len(),
        samples = samples.len(),
        "loaded inputs"
    );

    let run = run_classification(&geometries, &samples, &config.classifier_config())
        .context("network classification failed")?;

    if let Some(path) = &args.distances_csv {
        write_distances_csv(create(path)?, &run.records)?;
        tracing::info!(path = %path.display(), "exported distance table");
    }
    if let Some(path) = &args.paths_geojson {
        let paths = paths_collection(&run.records);
        write_feature_collection(create(path)?, &paths)?;
        tracing::info!(path = %path.display(), paths = paths.features.len(), "exported paths");
    }
    if let Some(path) = &args.degenerate_geojson {
        let zero = degenerate_collection(&run.records);
        if !zero.features.is_empty() {
            tracing::warn!(
                cases = zero.features.len(),
                "zero-distance cases exported for inspection"
            );
        }
        write_feature_collection(create(path)?, &zero)?;
    }
    if let Some(path) = &args.classes_csv {
        write_classes_csv(create(path)?, &run.classes)?;
        tracing::info!(path = %path.display(), "exported classes");
    }
    if let Some(path) = &args.summary_json {
        write_report(create(path)?, &RunReport::new(&run, started_at))?;
    }

    let summary = &run.summary;
    println!(
        "classified {} samples: {} by overlap, B={} C={} D={} (unreachable {}, degenerate {}, skipped paths {})",
        summary.samples,
        summary.resolved_by_overlap,
        summary.tier_b,
        summary.tier_c,
        summary.tier_d,
        summary.unreachable,
        summary.degenerate,
        summary.paths_skipped,
    );

    Ok(())
}
