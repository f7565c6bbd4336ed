use clap::{ArgGroup, Parser};
use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use leaf_doctor::synthetic::generate_leaf_sample;
use leaf_doctor::{DiagnosisRecord, LeafAnalyzer, LeafDoctorConfig};

#[derive(Parser, Debug)]
#[command(
    name = "leaf",
    about = "Diagnose leaf photos by brown/yellow coverage and write annotated copies",
    version,
    group(
        ArgGroup::new("input")
            .required(true)
            .multiple(true)
            .args(["image", "dir", "generate_sample"])
    )
)]
struct Cli {
    /// Image to analyze (repeatable)
    #[arg(short = 'i', long = "image")]
    image: Vec<PathBuf>,

    /// Directory whose image files are all analyzed
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// Where annotated `result_*` images are written
    #[arg(short = 'o', long = "out", default_value = "output")]
    out: PathBuf,

    /// JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the stress threshold (percent coverage)
    #[arg(short = 't', long = "threshold")]
    threshold: Option<f64>,

    /// Free-text note copied into every record
    #[arg(short = 'n', long = "note")]
    note: Option<String>,

    /// Print one JSON record per line
    #[arg(long = "json")]
    json: bool,

    /// Write a synthetic sample leaf to this path and exit
    #[arg(long = "generate-sample")]
    generate_sample: Option<PathBuf>,
}

fn is_image_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" | "webp"
    )
}

fn collect_inputs(cli: &Cli) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut images = cli.image.clone();
    if let Some(dir) = &cli.dir {
        if !dir.is_dir() {
            return Err(format!("Not a directory: {}", dir.display()).into());
        }
        let mut found: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_image_file(p))
            .collect();
        found.sort();
        images.extend(found);
    }
    Ok(images)
}

fn print_record(record: &DiagnosisRecord, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string(record)?);
        return Ok(());
    }
    let image = record
        .annotated_image_path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!(
        "{image}: {} ({:.1}%), cause: {}, treatment: {}, recovery: {}",
        record.disease, record.coverage_ratio, record.cause, record.treatment, record.recovery_likelihood
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Some(path) = &cli.generate_sample {
        generate_leaf_sample(path)?;
        log::info!("wrote sample leaf to {}", path.display());
        if cli.image.is_empty() && cli.dir.is_none() {
            return Ok(());
        }
    }

    let mut config = match &cli.config {
        Some(path) => LeafDoctorConfig::from_json_file(path)?,
        None => LeafDoctorConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.classification.threshold = threshold;
    }
    let analyzer = Arc::new(LeafAnalyzer::new(config)?);

    let images = collect_inputs(&cli)?;
    if images.is_empty() {
        log::warn!("no images to analyze");
        return Ok(());
    }

    let mut tasks = JoinSet::new();
    for (i, path) in images.iter().cloned().enumerate() {
        let analyzer = Arc::clone(&analyzer);
        let out = cli.out.clone();
        let note = cli.note.clone();
        tasks.spawn_blocking(move || {
            let result = analyzer.analyze_path(&path, &out, note.as_deref());
            (i, path, result)
        });
    }

    let mut results = Vec::with_capacity(images.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(i, _, _)| *i);

    let mut failed = 0usize;
    for (_, path, result) in results {
        match result {
            Ok(analysis) => print_record(&analysis.record, cli.json)?,
            Err(e) => {
                log::error!("{}: {e}", path.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} images failed", images.len()).into());
    }
    Ok(())
}
