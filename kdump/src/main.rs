//! Dumps the mesh in keyword files into a JSON.

#![allow(clippy::needless_return)] // i'll never forgive rust for this

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use kfile::prelude::*;
use log::{LevelFilter, info, error};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version)]
struct Cli {
  /// Output extra/debug info while loading.
  #[arg(short, long)]
  verbose: bool,
  /// Dump only the geometry of this part, instead of the whole model.
  #[arg(short = 'p', long = "part")]
  part: Option<usize>,
  /// How to dump part geometry.
  #[arg(short = 'm', long = "mode", value_enum, default_value_t)]
  mode: OutputMode,
  /// Also dump the load report.
  #[arg(short = 'r', long = "report")]
  report: bool,
  /// Path to write output to. If absent, writes to standard output.
  #[arg(short = 'o')]
  output: Option<PathBuf>,
  /// What to load, and how.
  #[command(flatten)]
  load: LoadArgs
}

/// The geometry of a single part.
#[derive(Serialize)]
struct PartDump<'a> {
  /// The part itself.
  part: &'a Part,
  /// The geometry of its elements, in order.
  geometry: Vec<ElementGeometry>
}

/// What gets written out.
#[derive(Serialize)]
#[serde(untagged)]
enum Dump<'a> {
  /// The whole model.
  Model(&'a MeshModel),
  /// One part.
  Part(PartDump<'a>)
}

/// The output, with or without the report.
#[derive(Serialize)]
struct Output<'a> {
  /// The dump.
  #[serde(flatten)]
  dump: Dump<'a>,
  /// The load report, if asked for.
  #[serde(skip_serializing_if = "Option::is_none")]
  report: Option<&'a LoadReport>
}

/// Logs an error and leaves.
fn bail(e: impl std::fmt::Display) -> ! {
  error!("{}", e);
  std::process::exit(1);
}

fn main() -> io::Result<()> {
  // init cli stuff
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };
  env_logger::builder().filter_level(log_level).init();
  // load
  let (model, load_report) = args.load.load().unwrap_or_else(|e| bail(e));
  let dump = match args.part.map(PartId) {
    Some(pid) => {
      let part = model.part_info(pid).unwrap_or_else(|e| bail(e));
      let geometry = model.part(pid, args.mode).unwrap_or_else(|e| bail(e));
      Dump::Part(PartDump { part, geometry })
    },
    None => Dump::Model(&model),
  };
  let output = Output {
    dump,
    report: args.report.then_some(&load_report)
  };
  // write
  let mut out: BufWriter<Box<dyn Write>> = BufWriter::new(
    if let Some(ref op) = args.output {
      Box::new(File::create(op)?)
    } else {
      Box::new(io::stdout())
    }
  );
  info!("Writing JSON...");
  serde_json::to_writer_pretty(&mut out, &output)?;
  writeln!(out)?;
  out.flush()?;
  info!("All done.");
  return Ok(());
}
