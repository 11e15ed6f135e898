//! Contains the error type for loading and querying a mesh.

use std::error::Error;
use std::fmt::Display;
use std::io;
use std::sync::Arc;

use crate::entities::EntityRef;
use crate::keywords::CardType;

/// Where a line came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
  /// The name of the source, usually a path.
  pub source: Arc<str>,
  /// The line number, 1-based.
  pub line: usize
}

impl Display for Location {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}:{}", self.source, self.line);
  }
}

/// Errors when loading or querying a mesh.
#[derive(Debug)]
#[non_exhaustive]
pub enum KFileError {
  /// A data line couldn't be decoded with its card's layout.
  MalformedCard {
    /// Where the line is.
    location: Location,
    /// The card being decoded.
    card: CardType,
    /// What went wrong.
    reason: String
  },
  /// An entity refers to another that doesn't exist.
  DanglingReference {
    /// The one doing the referring.
    from: EntityRef,
    /// The one that's missing.
    missing: EntityRef
  },
  /// A query asked for something that isn't there.
  NotFound(EntityRef),
  /// Couldn't read a source.
  Io {
    /// The name of the source.
    source_name: String,
    /// The underlying error.
    error: io::Error
  }
}

impl KFileError {
  /// Whether this is a malformed card error, the only kind a load may skip.
  pub fn is_malformed(&self) -> bool {
    return matches!(self, Self::MalformedCard { .. });
  }
}

impl Display for KFileError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::MalformedCard { location, card, reason } => write!(
        f, "{}: malformed {} card: {}", location, card, reason
      ),
      Self::DanglingReference { from, missing } => write!(
        f, "{} refers to {}, which does not exist", from, missing
      ),
      Self::NotFound(what) => write!(f, "{} not found", what),
      Self::Io { source_name, error } => write!(
        f, "could not read {}: {}", source_name, error
      ),
    };
  }
}

impl Error for KFileError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    if let Self::Io { error, .. } = self {
      return Some(error);
    }
    return None;
  }
}
