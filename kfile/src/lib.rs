//! This library implements types and functions to read the mesh data within
//! LS-DYNA keyword files (the card-based `*NODE`, `*ELEMENT_SHELL`, `*PART`
//! format) and to query it.
//!
//! Reading goes through a few layers, each only feeding the next:
//!   - the card reader classifies lines and tracks the keyword section;
//!   - the decoders split data lines into fixed-width fields and make records;
//!   - the mesh index puts records into an id-keyed model, merging sources;
//!   - the query functions read the finished model.
//!
//! The loader drives all of it:
//!
//! ```no_run
//! use kfile::prelude::*;
//!
//! let files = ["model_nodes.k", "model_mesh.k"];
//! let (model, _report) = MeshLoader::load_files(files, LoadSettings::default())
//!   .expect("couldn't load the model");
//! let quad = model.element_shell(ElementId(1), OutputMode::Indices);
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod decoders;
pub mod entities;
pub mod error;
pub mod fields;
pub mod keywords;
pub mod loader;
pub mod mesh;
pub mod query;
pub mod reader;
pub mod util;

#[cfg(test)]
mod tests;

/// Imports the most relevant exports from the library.
pub mod prelude {
  pub use super::entities::*;
  pub use super::error::*;
  pub use super::fields::FieldFormat;
  pub use super::keywords::CardType;
  pub use super::loader::*;
  pub use super::mesh::*;
  pub use super::query::*;
  pub use super::util::find_keyword_files;
}
