//! This module defines structures and code to represent the fixed-width fields
//! that make up the data lines of keyword cards.
//!
//! Every card kind has a layout: an ordered list of fields, each with a width
//! and a type. Layouts are tables, one per card kind and field format, so the
//! column boundaries live in exactly one place. A data line gets split into
//! raw fields with its layout, then each field is decoded on its own.

use std::fmt::Display;

use clap::ValueEnum;
use serde::{Serialize, Deserialize};

use crate::util::{decode_int, decode_kfloat};

/// The width of a small integer field (ids in node and shell cards).
pub const SMALL_FIELD_WIDTH: usize = 8;

/// The width of a medium integer field (ids in part cards, large-id format).
pub const MEDIUM_FIELD_WIDTH: usize = 10;

/// The width of a standard real field (node coordinates).
pub const REAL_FIELD_WIDTH: usize = 2*SMALL_FIELD_WIDTH;

/// The width of every field in the long format.
pub const LONG_FIELD_WIDTH: usize = 20;

/// The width of a part heading.
pub const HEADING_WIDTH: usize = 70;

/// The field formats a data line can be written in.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum
)]
pub enum FieldFormat {
  /// The usual 8/10/16-column fields.
  #[default]
  Standard,
  /// Integer fields widened to 10 columns (keyword suffix `%`).
  LargeIds,
  /// Every field 20 columns wide (keyword suffix `+`, or `LONG=Y`).
  Long
}

impl FieldFormat {
  /// Picks a format from a keyword name suffix, if there is one.
  pub const fn from_suffix(c: char) -> Option<Self> {
    return match c {
      '-' => Some(Self::Standard),
      '%' => Some(Self::LargeIds),
      '+' => Some(Self::Long),
      _ => None
    };
  }
}

/// The kind of value a field holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
  /// A base-10 integer.
  Integer,
  /// A real number, possibly in abbreviated exponent notation.
  Real,
  /// Free text.
  Text
}

/// A single field in a card layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
  /// The name of the field, as in the keyword manual.
  pub name: &'static str,
  /// The width in columns.
  pub width: usize,
  /// The kind of value.
  pub kind: FieldKind,
  /// Whether a blank or missing value is an error.
  pub required: bool
}

/// The different kinds of data line we know layouts for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardLayout {
  /// A `*NODE` line.
  Node,
  /// A `*ELEMENT_SHELL` line.
  ElementShell,
  /// The heading line of a `*PART`.
  PartHeading,
  /// The id line of a `*PART`.
  PartIds
}

/// Builds a static field table.
macro_rules! layout {
  ($(($name:literal, $width:expr, $kind:ident, $req:literal),)*) => {
    &[$(FieldSpec {
      name: $name,
      width: $width,
      kind: FieldKind::$kind,
      required: $req
    },)*]
  };
}

/// Builds the element shell table for an integer width.
macro_rules! shell_layout {
  ($w:expr) => {
    layout!(
      ("eid", $w, Integer, true),
      ("pid", $w, Integer, true),
      ("n1", $w, Integer, true),
      ("n2", $w, Integer, true),
      ("n3", $w, Integer, true),
      ("n4", $w, Integer, false),
      ("n5", $w, Integer, false),
      ("n6", $w, Integer, false),
      ("n7", $w, Integer, false),
      ("n8", $w, Integer, false),
    )
  };
}

/// Builds the part id table for an integer width.
macro_rules! part_ids_layout {
  ($w:expr) => {
    layout!(
      ("pid", $w, Integer, true),
      ("secid", $w, Integer, false),
      ("mid", $w, Integer, false),
      ("eosid", $w, Integer, false),
      ("hgid", $w, Integer, false),
      ("grav", $w, Integer, false),
      ("adpopt", $w, Integer, false),
      ("tmid", $w, Integer, false),
    )
  };
}

/// Builds the node table for an integer width and a real width.
macro_rules! node_layout {
  ($iw:expr, $rw:expr) => {
    layout!(
      ("nid", $iw, Integer, true),
      ("x", $rw, Real, true),
      ("y", $rw, Real, true),
      ("z", $rw, Real, true),
      ("tc", $iw, Real, false),
      ("rc", $iw, Real, false),
    )
  };
}

/// Node card, standard format.
const NODE_STANDARD: &[FieldSpec] =
  node_layout!(SMALL_FIELD_WIDTH, REAL_FIELD_WIDTH);

/// Node card, large-id format.
const NODE_LARGE_IDS: &[FieldSpec] =
  node_layout!(MEDIUM_FIELD_WIDTH, REAL_FIELD_WIDTH);

/// Node card, long format.
const NODE_LONG: &[FieldSpec] = node_layout!(LONG_FIELD_WIDTH, LONG_FIELD_WIDTH);

/// Shell card, standard format.
const SHELL_STANDARD: &[FieldSpec] = shell_layout!(SMALL_FIELD_WIDTH);

/// Shell card, large-id format.
const SHELL_LARGE_IDS: &[FieldSpec] = shell_layout!(MEDIUM_FIELD_WIDTH);

/// Shell card, long format.
const SHELL_LONG: &[FieldSpec] = shell_layout!(LONG_FIELD_WIDTH);

/// Part heading, any format.
const PART_HEADING: &[FieldSpec] = layout!(
  ("heading", HEADING_WIDTH, Text, false),
);

/// Part ids, standard and large-id formats.
const PART_IDS_STANDARD: &[FieldSpec] = part_ids_layout!(MEDIUM_FIELD_WIDTH);

/// Part ids, long format.
const PART_IDS_LONG: &[FieldSpec] = part_ids_layout!(LONG_FIELD_WIDTH);

/// Returns the field table for a kind of line in a given format.
pub const fn layout(card: CardLayout, format: FieldFormat) -> &'static [FieldSpec] {
  use FieldFormat::*;
  return match (card, format) {
    (CardLayout::Node, Standard) => NODE_STANDARD,
    (CardLayout::Node, LargeIds) => NODE_LARGE_IDS,
    (CardLayout::Node, Long) => NODE_LONG,
    (CardLayout::ElementShell, Standard) => SHELL_STANDARD,
    (CardLayout::ElementShell, LargeIds) => SHELL_LARGE_IDS,
    (CardLayout::ElementShell, Long) => SHELL_LONG,
    (CardLayout::PartHeading, _) => PART_HEADING,
    (CardLayout::PartIds, Standard | LargeIds) => PART_IDS_STANDARD,
    (CardLayout::PartIds, Long) => PART_IDS_LONG,
  };
}

/// Why a field couldn't be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
  /// The line ends before this required field starts.
  TooShort(&'static str),
  /// The required field is there, but blank.
  Blank(&'static str),
  /// The field should hold an integer and doesn't.
  NotInteger(&'static str, String),
  /// The field should hold a real and doesn't.
  NotReal(&'static str, String)
}

impl Display for FieldError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::TooShort(n) => write!(f, "line too short for field {}", n),
      Self::Blank(n) => write!(f, "required field {} is blank", n),
      Self::NotInteger(n, s) => {
        write!(f, "field {} is not an integer: \"{}\"", n, s)
      },
      Self::NotReal(n, s) => write!(f, "field {} is not a real: \"{}\"", n, s),
    };
  }
}

/// A data line broken into raw fields according to a layout. `None` means
/// the line ended before the field began.
#[derive(Clone, Debug)]
pub struct SplitLine<'a> {
  /// The layout used to split it.
  layout: &'static [FieldSpec],
  /// The raw, untrimmed fields.
  raw: Vec<Option<&'a str>>
}

impl<'a> SplitLine<'a> {
  /// Splits a line by columns, or by commas if it's written in free format.
  pub fn split(line: &'a str, layout: &'static [FieldSpec]) -> Self {
    if line.contains(',') {
      return Self::split_free(line, layout);
    }
    return Self::split_fixed(line, layout);
  }

  /// Splits a line strictly by columns.
  pub fn split_fixed(line: &'a str, layout: &'static [FieldSpec]) -> Self {
    let mut start = 0;
    let raw = layout.iter().map(|spec| {
      let field = column(line, start, spec.width);
      start += spec.width;
      field
    }).collect();
    return Self { layout, raw };
  }

  /// Splits a comma-separated line.
  pub fn split_free(line: &'a str, layout: &'static [FieldSpec]) -> Self {
    let mut parts = line.split(',');
    let raw = layout.iter().map(|_| parts.next()).collect();
    return Self { layout, raw };
  }

  /// Returns the field spec and trimmed value of a field, checking presence.
  fn present(&self, i: usize) -> Result<(&FieldSpec, Option<&'a str>), FieldError> {
    let spec = &self.layout[i];
    return match self.raw[i].map(str::trim) {
      None if spec.required => Err(FieldError::TooShort(spec.name)),
      Some("") if spec.required => Err(FieldError::Blank(spec.name)),
      None | Some("") => Ok((spec, None)),
      Some(s) => Ok((spec, Some(s))),
    };
  }

  /// Decodes an integer field. Optional blank fields give zero.
  pub fn integer(&self, i: usize) -> Result<usize, FieldError> {
    return match self.present(i)? {
      (_, None) => Ok(0),
      (spec, Some(s)) => decode_int(s)
        .ok_or_else(|| FieldError::NotInteger(spec.name, s.to_string())),
    };
  }

  /// Decodes a real field. Optional blank fields give zero.
  pub fn real(&self, i: usize) -> Result<f64, FieldError> {
    return match self.present(i)? {
      (_, None) => Ok(0.0),
      (spec, Some(s)) => decode_kfloat(s)
        .ok_or_else(|| FieldError::NotReal(spec.name, s.to_string())),
    };
  }

  /// Returns a text field, trimmed. Blank fields give an empty string.
  pub fn text(&self, i: usize) -> Result<&'a str, FieldError> {
    return Ok(self.present(i)?.1.unwrap_or(""));
  }

  /// Number of fields in the layout.
  pub fn len(&self) -> usize {
    return self.layout.len();
  }

  /// Whether the layout has no fields at all.
  pub fn is_empty(&self) -> bool {
    return self.layout.is_empty();
  }
}

/// Cuts `width` characters out of a line starting at character `start`.
/// Returns `None` if the line ends at or before `start`; a line that ends
/// midway through the field gives the partial field.
fn column(line: &str, start: usize, width: usize) -> Option<&str> {
  let mut bounds = line.char_indices()
    .map(|(i, _)| i)
    .chain(std::iter::once(line.len()));
  let begin = bounds.nth(start)?;
  if begin == line.len() {
    return None;
  }
  let end = bounds.nth(width - 1).unwrap_or(line.len());
  return Some(&line[begin..end]);
}
