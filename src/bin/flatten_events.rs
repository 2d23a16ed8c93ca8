//! Flatten reconstructed events into columnar JSON-lines output.
//!
//! Events come either from a JSON-lines input file (one `Event` document
//! per line) or from the built-in synthetic generator.

use clap::Parser;
use hlt_ntuple::assembler::EventAssembler;
use hlt_ntuple::config::JobConfig;
use hlt_ntuple::error::NtupleResult;
use hlt_ntuple::event::Event;
use hlt_ntuple::geometry::SurfaceAtlas;
use hlt_ntuple::store::JsonLinesWriter;
use hlt_ntuple::synthetic::SyntheticEventSource;
use log::{error, info};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "flatten_events", about = "Flatten reconstructed muon-trigger events into columnar rows")]
struct Args {
    /// JSON-lines file of events; omit to generate synthetic events
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output JSON-lines file
    #[arg(long)]
    output: PathBuf,

    /// Job configuration (classifier weights and scales)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detector-surface placements as a JSON document
    #[arg(long)]
    geometry: Option<PathBuf>,

    /// Number of synthetic events when no input is given
    #[arg(long, default_value_t = 100)]
    events: usize,

    /// Seed for the synthetic generator
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> NtupleResult<()> {
    let config = match &args.config {
        Some(path) => JobConfig::from_path(path)?,
        None => JobConfig::default(),
    };
    let geometry: Arc<SurfaceAtlas> = Arc::new(match &args.geometry {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => SurfaceAtlas::new(),
    });

    let mut assembler = EventAssembler::new(geometry, config.build_scorers()?);
    let mut store = JsonLinesWriter::new(BufWriter::new(File::create(&args.output)?));
    assembler.register_schema(&mut store)?;

    let mut processed = 0usize;
    match &args.input {
        Some(path) => {
            info!("flattening events from {}", path.display());
            for line in BufReader::new(File::open(path)?).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let event: Event = serde_json::from_str(&line)?;
                assembler.process(&event, &mut store)?;
                processed += 1;
            }
        }
        None => {
            info!("generating {} synthetic events, seed {}", args.events, args.seed);
            let mut source = SyntheticEventSource::new(args.seed);
            for _ in 0..args.events {
                let event = source.next();
                assembler.process(&event, &mut store)?;
                processed += 1;
            }
        }
    }

    store.into_inner()?;
    info!("wrote {} rows to {}", processed, args.output.display());
    Ok(())
}
