use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use image::RgbImage;
use iris_core::attendance::{check_in, enroll, EnrollmentRequest};
use iris_core::preprocess::decode_image;
use iris_core::{EngineConfig, Pipeline};
use iris_store::Store;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "iris", about = "Iris eye-region attendance CLI")]
struct Cli {
    /// SQLite database (default: $XDG_DATA_HOME/iris/attendance.db)
    #[arg(long, global = true, env = "IRIS_DB_PATH")]
    db: Option<PathBuf>,
    /// TOML file with engine parameters
    #[arg(long, global = true, env = "IRIS_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a person from an eye image
    Enroll {
        /// Organisation-issued identity (e.g. staff number)
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: String,
        image: PathBuf,
        /// Write the image with detected eye regions drawn on it
        #[arg(long)]
        annotated: Option<PathBuf>,
    },
    /// Verify an eye image and record attendance on a match
    Verify {
        image: PathBuf,
        #[arg(long)]
        annotated: Option<PathBuf>,
    },
    /// List enrollments
    List,
    /// Show the attendance log, newest first
    Logs {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Run the pipeline on an image without touching the database
    Inspect {
        image: PathBuf,
        #[arg(long)]
        annotated: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let engine_config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Enroll {
            id,
            name,
            department,
            image,
            annotated,
        } => {
            let pipeline = Pipeline::new(engine_config)?;
            let store = open_store(cli.db)?;
            let frame = load_image(&image)?;
            let request = EnrollmentRequest {
                identity: &id,
                name: &name,
                attribute: &department,
            };
            let outcome = enroll(&pipeline, &store, request, &frame)?;
            save_preview(annotated.as_deref(), &outcome.preview)?;
            println!(
                "Enrolled {name} ({id}) as record {} with {} descriptors",
                outcome.record_id, outcome.descriptor_count
            );
        }
        Commands::Verify { image, annotated } => {
            let pipeline = Pipeline::new(engine_config)?;
            let store = open_store(cli.db)?;
            let frame = load_image(&image)?;
            let outcome = check_in(&pipeline, &store, &frame, Utc::now())?;
            if let Some(preview) = &outcome.result.preview {
                save_preview(annotated.as_deref(), preview)?;
            }
            for skip in &outcome.skipped {
                eprintln!("skipped record {} ({}): {}", skip.record_id, skip.identity, skip.reason);
            }
            match &outcome.result.matched {
                Some(m) => println!(
                    "Present: {} ({}, {}) score {}",
                    m.name, m.identity, m.attribute, outcome.result.score
                ),
                None => {
                    println!("Unknown: best score {}", outcome.result.score);
                    std::process::exit(1);
                }
            }
        }
        Commands::List => {
            let store = open_store(cli.db)?;
            let list = store.list_enrollments()?;
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        Commands::Logs { limit } => {
            let store = open_store(cli.db)?;
            let log = store.attendance_log(limit)?;
            println!("{}", serde_json::to_string_pretty(&log)?);
        }
        Commands::Inspect { image, annotated } => {
            let pipeline = Pipeline::new(engine_config)?;
            let frame = load_image(&image)?;
            let analysis = pipeline.analyze(&frame)?;
            save_preview(annotated.as_deref(), &analysis.preview)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "width": frame.width(),
                    "height": frame.height(),
                    "regions": analysis.regions,
                    "cropped": analysis.cropped,
                    "keypoints": analysis.features.keypoints.len(),
                    "descriptors": analysis.descriptors().len(),
                    "descriptor_bits": analysis.descriptors().bit_width(),
                }))?
            );
        }
    }

    Ok(())
}

fn open_store(db: Option<PathBuf>) -> Result<Store> {
    let path = db.unwrap_or_else(Store::default_path);
    Store::open(&path).with_context(|| format!("opening {}", path.display()))
}

fn load_image(path: &Path) -> Result<image::DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    decode_image(&bytes).with_context(|| format!("decoding {}", path.display()))
}

fn save_preview(path: Option<&Path>, preview: &RgbImage) -> Result<()> {
    if let Some(path) = path {
        preview
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Annotated image written to {}", path.display());
    }
    Ok(())
}
