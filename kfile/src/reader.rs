//! This module implements the card reader: the one-pass state machine that
//! classifies raw lines and tags data lines with the section they fall under.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::Location;
use crate::fields::FieldFormat;
use crate::keywords::{CardType, KeywordLine, Section};

/// The reader might respond this when fed a line.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ReaderResponse<'a> {
  /// The line was blank, outside of a card section.
  Blank,
  /// The line was a comment.
  Comment,
  /// The line started a section.
  BeginSection(Section),
  /// The line holds data for a supported card.
  Data(CardLine<'a>),
  /// The line holds data we don't care about, or came before any keyword.
  Dropped
}

/// A data line, tagged with everything a decoder needs to know about it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardLine<'a> {
  /// The card it belongs to.
  pub card: CardType,
  /// The field format in effect.
  pub format: FieldFormat,
  /// The name of the source it came from.
  pub source: Arc<str>,
  /// The line number within the source, 1-based.
  pub line: usize,
  /// The text, without trailing whitespace. Leading whitespace is kept since
  /// columns are significant. Empty for a blank card.
  pub text: &'a str
}

impl CardLine<'_> {
  /// Where this line is.
  pub fn location(&self) -> Location {
    return Location { source: self.source.clone(), line: self.line };
  }
}

/// This is the card reader -- it doesn't care how lines are fed into it.
/// Section state lives on across sources, so a file can carry on with a
/// section started in the previous one.
#[derive(Clone, Debug)]
pub struct CardReader {
  /// The current section.
  section: Section,
  /// The format for cards that don't pick one.
  default_format: FieldFormat,
  /// The name of the current source.
  source: Arc<str>,
  /// The line number within the current source.
  line: usize,
  /// The total number of consumed lines.
  total_lines: usize,
  /// How many sections of each unsupported keyword we skipped.
  skipped: BTreeMap<String, usize>
}

impl Default for CardReader {
  fn default() -> Self {
    return Self::new(FieldFormat::default());
  }
}

impl CardReader {
  /// Instantiates a new reader.
  pub fn new(default_format: FieldFormat) -> Self {
    return Self {
      section: Section::None,
      default_format,
      source: Arc::from("<input>"),
      line: 0,
      total_lines: 0,
      skipped: BTreeMap::new()
    };
  }

  /// Tells the reader the following lines come from another source. Keeps
  /// the current section.
  pub fn begin_source(&mut self, name: &str) {
    self.source = Arc::from(name);
    self.line = 0;
  }

  /// The current section.
  pub fn section(&self) -> &Section {
    return &self.section;
  }

  /// The total number of consumed lines, across all sources.
  pub fn total_lines(&self) -> usize {
    return self.total_lines;
  }

  /// Where the last consumed line was.
  pub fn location(&self) -> Location {
    return Location { source: self.source.clone(), line: self.line };
  }

  /// Names and counts of the unsupported sections we skipped.
  pub fn skipped_keywords(&self) -> &BTreeMap<String, usize> {
    return &self.skipped;
  }

  /// Handles a keyword line, switching sections.
  fn switch_section(&mut self, kw: KeywordLine) -> Section {
    if let Some(fmt) = kw.default_format() {
      debug!("{}: default field format is now {:?}.", self.location(), fmt);
      self.default_format = fmt;
    }
    let section = kw.section(self.default_format);
    match section {
      Section::Skip(ref name) => {
        *self.skipped.entry(name.clone()).or_insert(0) += 1;
        if name.starts_with(CardType::ElementShell.name()) {
          warn!(
            "{}: unsupported shell variant *{}, skipping.",
            self.location(),
            name
          );
        } else {
          debug!("{}: skipping *{} section.", self.location(), name);
        }
      },
      _ => debug!("{}: entering {}.", self.location(), section),
    }
    self.section = section.clone();
    return section;
  }

  /// Consumes a line into the reader.
  pub fn consume<'a>(&mut self, line: &'a str) -> ReaderResponse<'a> {
    self.line += 1;
    self.total_lines += 1;
    let text = line.trim_end();
    if text.is_empty() {
      // a blank card can stand in for a whole line of defaults
      return match self.section {
        Section::Card { .. } => self.data(text),
        _ => ReaderResponse::Blank,
      };
    }
    if text.starts_with('$') {
      return ReaderResponse::Comment;
    }
    if let Some(kw) = KeywordLine::parse(text) {
      return ReaderResponse::BeginSection(self.switch_section(kw));
    }
    return match self.section {
      Section::Card { .. } => self.data(text),
      Section::None | Section::Control(_) | Section::Skip(_) => {
        ReaderResponse::Dropped
      },
    };
  }

  /// Tags a line as data for the current card section.
  fn data<'a>(&self, text: &'a str) -> ReaderResponse<'a> {
    return match self.section {
      Section::Card { card, format, .. } => ReaderResponse::Data(CardLine {
        card,
        format,
        source: self.source.clone(),
        line: self.line,
        text
      }),
      _ => ReaderResponse::Dropped,
    };
  }
}
