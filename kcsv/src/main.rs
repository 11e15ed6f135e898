//! A command-line application to convert the mesh in keyword files to CSV: a
//! vertex row per node, then a face row per shell element.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use log::*;
use kfile::prelude::*;

/// Tag of vertex rows.
const VERTEX_TAG: &str = "v";

/// Tag of face rows.
const FACE_TAG: &str = "f";

/// The arguments passed to the converter.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
struct Cli {
  /// Only write faces from this part. The vertex rows always hold every node
  /// so that face indices mean the same thing either way.
  #[arg(short = 'p', long = "part")]
  part: Option<usize>,
  /// The delimiter used in the CSV.
  #[arg(short = 'D', long = "delim", default_value = ",")]
  delim: char,
  /// Output extra/debug info while loading and converting.
  #[arg(short = 'v', long = "verbose")]
  verbose: bool,
  /// Enable writing CSV headers, once before the vertices and once before the
  /// faces.
  #[arg(short = 'H', long = "headers")]
  headers: bool,
  /// Path to write output to. If absent, writes to standard output.
  #[arg(short = 'o')]
  output: Option<PathBuf>,
  /// What to load, and how.
  #[command(flatten)]
  load: LoadArgs
}

/// Writes the shared mesh as CSV rows.
fn write_mesh<W: Write>(
  wtr: &mut csv::Writer<W>,
  mesh: &SharedMesh,
  headers: bool
) -> csv::Result<()> {
  if headers {
    wtr.write_record(["type", "index", "nid", "x", "y", "z"])?;
  }
  let vertices = mesh.node_ids.iter().zip(mesh.vertices.iter());
  for (i, (nid, p)) in vertices.enumerate() {
    wtr.write_record([
      VERTEX_TAG.to_string(),
      i.to_string(),
      nid.to_string(),
      p.x.to_string(),
      p.y.to_string(),
      p.z.to_string()
    ])?;
  }
  if headers {
    wtr.write_record(["type", "pid", "eid", "i", "j", "k", "l"])?;
  }
  for face in mesh.faces.iter() {
    let fields = [
      FACE_TAG.to_string(),
      face.part.to_string(),
      face.element.to_string()
    ];
    wtr.write_record(
      fields.into_iter().chain(face.vertices.iter().map(|v| v.to_string()))
    )?;
  }
  return Ok(());
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
  // load the model
  let (model, _) = match args.load.load() {
    Ok(x) => x,
    Err(e) => {
      error!("{}", e);
      std::process::exit(1);
    }
  };
  let mesh = match model.shared_mesh(args.part.map(PartId)) {
    Ok(m) => m,
    Err(e) => {
      error!("{}", e);
      std::process::exit(1);
    }
  };
  info!("Done loading.");
  // init the csv writer
  let output: BufWriter<Box<dyn Write>> = BufWriter::new(
    if let Some(ref op) = args.output {
      Box::new(File::create(op)?)
    } else {
      Box::new(io::stdout())
    }
  );
  let delim_byte: u8 = match args.delim.try_into() {
    Ok(b) => b,
    Err(_) => {
      error!("Delimiter must be a single-byte character!");
      std::process::exit(1);
    }
  };
  // triangles have one index less than quads
  let mut wtr = csv::WriterBuilder::new()
    .delimiter(delim_byte)
    .flexible(true)
    .from_writer(output);
  info!("Writing CSV records...");
  write_mesh(&mut wtr, &mesh, args.headers)?;
  wtr.flush()?;
  info!(
    "Wrote {} vertices and {} faces.",
    mesh.vertices.len(),
    mesh.faces.len()
  );
  // done
  return Ok(());
}
