//! Loads keyword files and tells you what's in them: counts, parts, skipped
//! sections, and optionally the geometry of some nodes, elements and parts.

#![allow(clippy::needless_return)] // i'll never forgive rust for this

use clap::Parser;
use kfile::prelude::*;
use log::{LevelFilter, info, error, warn};
use nalgebra::Point3;

const INDENT: &str = "  ";

#[derive(Parser)]
#[command(author, version)]
struct Cli {
  /// Output extra/debug info while loading.
  #[arg(short, long)]
  verbose: bool,
  /// Print the coordinates of these nodes. Comma-separated.
  #[arg(short = 'n', long = "nodes", num_args = 0.., value_delimiter = ',')]
  nodes: Vec<usize>,
  /// Print the geometry of these elements. Comma-separated.
  #[arg(short = 'e', long = "elements", num_args = 0.., value_delimiter = ',')]
  elements: Vec<usize>,
  /// Print the geometry of every element in these parts. Comma-separated.
  #[arg(short = 'p', long = "parts", num_args = 0.., value_delimiter = ',')]
  parts: Vec<usize>,
  /// How to print element geometry.
  #[arg(short = 'm', long = "mode", value_enum, default_value_t)]
  mode: OutputMode,
  /// What to load, and how.
  #[command(flatten)]
  load: LoadArgs
}

/// Formats a point on one line.
fn point(p: &Point3<f64>) -> String {
  return format!("({}, {}, {})", p.x, p.y, p.z);
}

/// Formats element geometry on one line.
fn geometry(g: &ElementGeometry) -> String {
  return match g {
    ElementGeometry::Coordinates(v) => {
      v.iter().map(point).collect::<Vec<_>>().join(" ")
    },
    ElementGeometry::Indices(v) => {
      v.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
    },
  };
}

/// Logs a failed query without stopping.
fn report<T>(what: String, res: Result<T, KFileError>, show: impl Fn(T) -> String) {
  match res {
    Ok(x) => info!("{}- {}: {}", INDENT, what, show(x)),
    Err(e) => warn!("{}- {}: {}", INDENT, what, e),
  }
}

fn main() {
  // init cli stuff
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };
  env_logger::builder().filter_level(log_level).init();
  // load everything
  let (model, load_report) = match args.load.load() {
    Ok(x) => x,
    Err(e) => {
      error!("{}", e);
      std::process::exit(1);
    }
  };
  // load info
  info!("Loaded {} source(s):", load_report.sources.len());
  for src in load_report.sources.iter() {
    info!("{}- {}", INDENT, src);
  }
  info!(
    "Read {} lines, decoded {} records, {} of which overwrote earlier ones.",
    load_report.lines,
    load_report.records,
    load_report.overwrites
  );
  if load_report.skipped_lines > 0 {
    warn!("Skipped {} malformed lines.", load_report.skipped_lines);
  }
  if load_report.unsupported_keywords.is_empty() {
    info!("No unsupported sections were found.");
  } else {
    info!("Unsupported sections that were skipped:");
    for (name, count) in load_report.unsupported_keywords.iter() {
      info!("{}- *{}: {} time(s)", INDENT, name, count);
    }
  }
  // model info
  info!(
    "The model has {} nodes, {} shell elements and {} parts.",
    model.node_count(),
    model.element_count(),
    model.part_count()
  );
  for part in model.iter_parts() {
    let triangles = part.elements.iter()
      .filter_map(|eid| model.element(*eid).ok())
      .filter(|e| e.is_triangle())
      .count();
    let title = if part.is_declared() {
      format!("\"{}\"", part.title())
    } else {
      String::from("(no *PART card)")
    };
    info!(
      "{}- Part {} {}: {} elements ({} triangles, {} quads)",
      INDENT,
      part.id,
      title,
      part.elements.len(),
      triangles,
      part.elements.len() - triangles
    );
  }
  // queries
  if !args.nodes.is_empty() {
    info!("Nodes:");
    for nid in args.nodes.iter().copied().map(NodeId) {
      report(format!("Node {}", nid), model.node_coords(nid), |p| point(&p));
    }
  }
  if !args.elements.is_empty() {
    info!("Elements:");
    for eid in args.elements.iter().copied().map(ElementId) {
      let res = model.element_shell(eid, args.mode);
      report(format!("Element {}", eid), res, |g| geometry(&g));
    }
  }
  if !args.parts.is_empty() {
    info!("Parts:");
    for pid in args.parts.iter().copied().map(PartId) {
      let res = model.part_info(pid).and_then(|p| {
        let geoms = model.part(pid, args.mode)?;
        return Ok(p.elements.iter().copied().zip(geoms));
      });
      match res {
        Ok(rows) => {
          info!("{}- Part {}:", INDENT, pid);
          for (eid, g) in rows {
            info!("{}{}- Element {}: {}", INDENT, INDENT, eid, geometry(&g));
          }
        },
        Err(e) => warn!("{}- Part {}: {}", INDENT, pid, e),
      }
    }
  }
}
