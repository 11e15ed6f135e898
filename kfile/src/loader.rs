//! This module implements the loader, which feeds sources through the card
//! reader and the decoders into a mesh index, in order. Also home to the load
//! settings and the command-line arguments that set them.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};

use crate::decoders::CardDecoder;
use crate::error::KFileError;
use crate::fields::FieldFormat;
use crate::keywords::Section;
use crate::mesh::{MeshIndex, MeshModel, ReferenceCheck};
use crate::reader::{CardReader, ReaderResponse};
use crate::util::find_keyword_files;

/// What to do with a data line that can't be decoded.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum
)]
pub enum MalformedPolicy {
  /// Stop the load.
  #[default]
  Abort,
  /// Warn, count it, and carry on.
  Skip
}

/// Knobs for a load.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq
)]
pub struct LoadSettings {
  /// Field format for cards that don't pick one.
  pub format: FieldFormat,
  /// What to do with malformed lines.
  pub on_malformed: MalformedPolicy,
  /// When to check references.
  pub references: ReferenceCheck
}

/// What happened during a load.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadReport {
  /// The sources, in load order.
  pub sources: Vec<String>,
  /// Lines consumed.
  pub lines: usize,
  /// Records decoded.
  pub records: usize,
  /// Malformed lines skipped.
  pub skipped_lines: usize,
  /// Records that replaced an earlier one with the same id.
  pub overwrites: usize,
  /// Unsupported keywords skipped, and how many sections of each.
  pub unsupported_keywords: BTreeMap<String, usize>
}

/// Feeds sources into a mesh index. One-pass, single-thread.
pub struct MeshLoader {
  /// The settings.
  settings: LoadSettings,
  /// The card reader.
  reader: CardReader,
  /// The decoder for the section we're in, if it's a supported one.
  decoder: Option<Box<dyn CardDecoder>>,
  /// The index being built.
  index: MeshIndex,
  /// The report so far.
  report: LoadReport
}

impl Default for MeshLoader {
  fn default() -> Self {
    return Self::new(LoadSettings::default());
  }
}

impl MeshLoader {
  /// Instantiates a new loader.
  pub fn new(settings: LoadSettings) -> Self {
    return Self {
      settings,
      reader: CardReader::new(settings.format),
      decoder: None,
      index: MeshIndex::new(),
      report: LoadReport::default()
    };
  }

  /// Deals with an error according to the malformed line policy.
  fn handle(&mut self, res: Result<(), KFileError>) -> Result<(), KFileError> {
    return match res {
      Err(e) if e.is_malformed()
        && self.settings.on_malformed == MalformedPolicy::Skip => {
        warn!("Skipping line: {}", e);
        self.report.skipped_lines += 1;
        Ok(())
      },
      other => other,
    };
  }

  /// Finishes the current decoder, if any.
  fn flush_decoder(&mut self) -> Result<(), KFileError> {
    if let Some(mut dec) = self.decoder.take() {
      debug!(
        "Finishing up a {} section at {}.",
        dec.card_type(),
        self.reader.location()
      );
      let res = dec.finish();
      return self.handle(res);
    }
    return Ok(());
  }

  /// Consumes a line into the loader.
  pub fn consume(&mut self, line: &str) -> Result<(), KFileError> {
    let res = match self.reader.consume(line) {
      ReaderResponse::BeginSection(section) => {
        self.flush_decoder()?;
        if let Section::Card { card, continuation, .. } = section {
          self.decoder = Some(card.init_decoder(continuation));
        }
        Ok(())
      },
      ReaderResponse::Data(card_line) => match self.decoder.as_mut() {
        Some(dec) => match dec.consume(&card_line) {
          Ok(Some(record)) => {
            self.report.records += 1;
            self.index.insert(record);
            Ok(())
          },
          Ok(None) => Ok(()),
          Err(e) => Err(e),
        },
        None => Ok(()),
      },
      _ => Ok(()),
    };
    return self.handle(res);
  }

  /// Reads a whole source from a BufRead instance.
  pub fn read_bufread<R: BufRead>(
    &mut self,
    reader: R,
    name: &str
  ) -> Result<(), KFileError> {
    self.reader.begin_source(name);
    self.report.sources.push(name.to_string());
    let before = self.report.records;
    for line in reader.lines() {
      let line = line.map_err(|error| KFileError::Io {
        source_name: name.to_string(),
        error
      })?;
      self.consume(&line)?;
    }
    info!("Read {} records from {}.", self.report.records - before, name);
    return Ok(());
  }

  /// Utility method -- opens and reads a file.
  pub fn read_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), KFileError> {
    let name = path.as_ref().display().to_string();
    let file = File::open(path.as_ref()).map_err(|error| KFileError::Io {
      source_name: name.clone(),
      error
    })?;
    return self.read_bufread(BufReader::new(file), &name);
  }

  /// Finishes up and returns the model and the report.
  pub fn finish(mut self) -> Result<(MeshModel, LoadReport), KFileError> {
    self.flush_decoder()?;
    let mut report = self.report;
    report.lines = self.reader.total_lines();
    report.overwrites = self.index.overwrites();
    report.unsupported_keywords = self.reader.skipped_keywords().clone();
    let model = self.index.finalize(self.settings.references)?;
    info!("Finished reading keyword files!");
    info!("Total nodes: {}", model.node_count());
    info!("Total elements: {}", model.element_count());
    info!("Total parts: {}", model.part_count());
    return Ok((model, report));
  }

  /// Loads files in order into a single model.
  pub fn load_files<I, P>(
    paths: I,
    settings: LoadSettings
  ) -> Result<(MeshModel, LoadReport), KFileError>
    where I: IntoIterator<Item = P>, P: AsRef<Path> {
    let mut loader = Self::new(settings);
    for path in paths {
      loader.read_file(path)?;
    }
    return loader.finish();
  }

  /// Loads a single in-memory source.
  pub fn load_bufread<R: BufRead>(
    reader: R,
    name: &str,
    settings: LoadSettings
  ) -> Result<(MeshModel, LoadReport), KFileError> {
    let mut loader = Self::new(settings);
    loader.read_bufread(reader, name)?;
    return loader.finish();
  }

  /// Loads a string. Mostly handy for tests.
  pub fn load_str(
    text: &str,
    settings: LoadSettings
  ) -> Result<(MeshModel, LoadReport), KFileError> {
    return Self::load_bufread(text.as_bytes(), "<string>", settings);
  }
}

/// Command-line arguments to pick the inputs and tune the load. Meant to be
/// flattened into a binary's own arguments.
#[derive(Clone, Debug, Args)]
pub struct LoadArgs {
  /// Load every .k/.key/.dyn file in this directory, in name order.
  #[arg(short = 'd', long = "directory", conflicts_with = "files")]
  pub directory: Option<PathBuf>,
  /// Field format for cards that don't pick one.
  #[arg(short = 'f', long = "format", value_enum, default_value_t)]
  pub format: FieldFormat,
  /// What to do with lines that can't be decoded.
  #[arg(long = "on-malformed", value_enum, default_value_t)]
  pub on_malformed: MalformedPolicy,
  /// When to check that elements and parts refer to things that exist.
  #[arg(long = "references", value_enum, default_value_t)]
  pub references: ReferenceCheck,
  /// Keyword files, loaded in order. Later files win id collisions.
  #[arg(required_unless_present = "directory")]
  pub files: Vec<PathBuf>
}

impl LoadArgs {
  /// The settings these arguments ask for.
  pub fn settings(&self) -> LoadSettings {
    return LoadSettings {
      format: self.format,
      on_malformed: self.on_malformed,
      references: self.references
    };
  }

  /// The files to load, in order.
  pub fn paths(&self) -> io::Result<Vec<PathBuf>> {
    return match self.directory {
      Some(ref dir) => find_keyword_files(dir),
      None => Ok(self.files.clone()),
    };
  }

  /// Loads the files these arguments point to.
  pub fn load(&self) -> Result<(MeshModel, LoadReport), KFileError> {
    let paths = self.paths().map_err(|error| KFileError::Io {
      source_name: self.directory.as_ref()
        .map_or(String::from("<files>"), |d| d.display().to_string()),
      error
    })?;
    return MeshLoader::load_files(paths, self.settings());
  }
}
