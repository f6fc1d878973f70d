use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use face_patches::config::{DatasetConfig, SourceSpec, parse_resize};
use face_patches::{DatasetBuilder, FsImageStore, IdAllocator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crop annotated faces and sample non-overlapping background patches.
#[derive(Parser, Debug)]
#[command(name = "face-patches", version, about)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the image folders and annotation files
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Output directory; `faces/` and `non_faces/` are created inside
    #[arg(long)]
    output: Option<PathBuf>,

    /// `folder` or `folder:annotations.txt`, repeatable
    #[arg(long = "source")]
    sources: Vec<SourceSpec>,

    /// Output patch size, e.g. `64x64`
    #[arg(long, value_parser = parse_resize)]
    resize: Option<[u32; 2]>,

    /// Sampling attempts per non-face patch
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Non-face patches requested per face
    #[arg(long)]
    patches_per_face: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// First file number for faces
    #[arg(long)]
    face_start: Option<u64>,

    /// First file number for non-faces
    #[arg(long)]
    nonface_start: Option<u64>,

    /// Write the run summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long, default_value_t = false)]
    print_config: bool,
}

impl Args {
    fn into_config(self) -> Result<(DatasetConfig, Option<PathBuf>, bool)> {
        let mut cfg = match &self.config {
            Some(path) => DatasetConfig::from_file(path)?,
            None => DatasetConfig::default(),
        };
        if let Some(v) = self.base_dir { cfg.base_dir = v; }
        if let Some(v) = self.output { cfg.output_dir = v; }
        if !self.sources.is_empty() { cfg.sources = self.sources; }
        if let Some(v) = self.resize { cfg.resize = v; }
        if let Some(v) = self.max_attempts { cfg.max_attempts = v; }
        if let Some(v) = self.patches_per_face { cfg.patches_per_face = v; }
        if self.seed.is_some() { cfg.seed = self.seed; }
        if let Some(v) = self.face_start { cfg.first_face_id = v; }
        if let Some(v) = self.nonface_start { cfg.first_nonface_id = v; }
        Ok((cfg, self.summary, self.print_config))
    }
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let (cfg, summary_path, print_config) = Args::parse().into_config()?;
    if print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }
    cfg.validate()?;

    let rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(
        "event" = "run.start",
        base_dir = %cfg.base_dir.display(),
        output = %cfg.output_dir.display(),
        sources = cfg.sources.len(),
        seed = ?cfg.seed
    );

    let mut ids = IdAllocator::new(cfg.first_face_id, cfg.first_nonface_id);
    let mut builder = DatasetBuilder::new(&cfg, FsImageStore::default(), rng);
    let summary = builder.run(&mut ids).context("dataset build failed")?;

    if let Some(path) = summary_path {
        let body = serde_json::to_string_pretty(&summary)?;
        fs::write(&path, body).with_context(|| format!("cannot write summary {}", path.display()))?;
        info!("event" = "summary.written", path = %path.display());
    }
    Ok(())
}
