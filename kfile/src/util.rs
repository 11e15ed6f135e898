//! This module implements utility functions without much need for defining
//! context or not enough of it to warrant them having their own modules.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extensions we consider to be keyword files when scanning a directory.
pub const KEYWORD_EXTENSIONS: &[&str] = &["k", "key", "dyn"];

/// Decodes a keyword-format floating point number. Takes the usual decimal
/// and exponential forms, Fortran-style `D` exponents, and the abbreviated
/// form with no exponent letter at all (`1.5-3` means `1.5e-3`).
///
/// The abbreviated form gets rewritten into the standard one and handed to the
/// standard parser, so `1.5-3` and `1.5e-3` give the exact same bits.
pub(crate) fn decode_kfloat(s: &str) -> Option<f64> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  let normal: String = s.chars()
    .map(|c| if c == 'd' || c == 'D' { 'e' } else { c })
    .collect();
  // no letters beyond the exponent marker, so "inf" and "nan" stay out
  if !normal.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
    return None;
  }
  let candidate = match abbreviated_exponent(&normal) {
    Some(i) => format!("{}e{}", &normal[..i], &normal[i..]),
    None => normal,
  };
  return candidate.parse::<f64>().ok().filter(|f| f.is_finite());
}

/// Finds the start of an exponent that lacks its letter: a sign that comes
/// right after a digit or a dot.
fn abbreviated_exponent(s: &str) -> Option<usize> {
  let bytes = s.as_bytes();
  return (1..bytes.len()).find(|&i| {
    (bytes[i] == b'+' || bytes[i] == b'-')
      && (bytes[i-1].is_ascii_digit() || bytes[i-1] == b'.')
  });
}

/// Decodes a keyword-format integer. Base-10, digits only.
pub(crate) fn decode_int(s: &str) -> Option<usize> {
  let s = s.trim();
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  return s.parse().ok();
}

/// Returns the keyword files in a directory, sorted by name so that the load
/// order (and thus which record wins an id collision) is reproducible.
pub fn find_keyword_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
  let mut found = Vec::new();
  for entry in fs::read_dir(dir.as_ref())? {
    let path = entry?.path();
    let is_kfile = path.extension()
      .and_then(|e| e.to_str())
      .is_some_and(|e| {
        KEYWORD_EXTENSIONS.iter().any(|k| k.eq_ignore_ascii_case(e))
      });
    if path.is_file() && is_kfile {
      found.push(path);
    }
  }
  found.sort();
  return Ok(found);
}
