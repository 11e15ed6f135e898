//! This module implements the mesh index, which assembles decoded records
//! into a cross-referenced model, and the model itself.

use clap::ValueEnum;
use indexmap::IndexMap;
use log::debug;
use serde::{Serialize, Deserialize};

use crate::entities::*;
use crate::error::KFileError;

/// When to check that every reference resolves.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum
)]
pub enum ReferenceCheck {
  /// Don't check when finalizing; queries find out.
  #[default]
  Deferred,
  /// Check everything when finalizing.
  Strict
}

/// The mesh model: nodes, shell elements and parts, each keyed by id and kept
/// in the order they first appeared. Read-only once built; see the `query`
/// module for the read API.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MeshModel {
  /// The nodes.
  pub(crate) nodes: IndexMap<NodeId, Node>,
  /// The shell elements.
  pub(crate) elements: IndexMap<ElementId, ElementShell>,
  /// The parts.
  pub(crate) parts: IndexMap<PartId, Part>
}

impl MeshModel {
  /// Checks every element's nodes and that every part was declared.
  pub fn check_references(&self) -> Result<(), KFileError> {
    for element in self.elements.values() {
      let missing = element.nodes.iter().find(|n| !self.nodes.contains_key(*n));
      if let Some(nid) = missing {
        return Err(KFileError::DanglingReference {
          from: element.id.into(),
          missing: (*nid).into()
        });
      }
    }
    for part in self.parts.values() {
      let missing = part.elements.iter()
        .find(|e| !self.elements.contains_key(*e));
      if let Some(eid) = missing {
        return Err(KFileError::DanglingReference {
          from: part.id.into(),
          missing: (*eid).into()
        });
      }
      if !part.is_declared() {
        // elements are the only thing that can conjure up a part
        let from = part.elements.first()
          .map_or(EntityRef::Part(part.id), |e| (*e).into());
        return Err(KFileError::DanglingReference {
          from,
          missing: part.id.into()
        });
      }
    }
    return Ok(());
  }
}

/// Builds a mesh model out of records.
#[derive(Clone, Debug, Default)]
pub struct MeshIndex {
  /// The model being built.
  model: MeshModel,
  /// Number of records that replaced an earlier one.
  overwrites: usize
}

impl MeshIndex {
  /// Instantiates an empty index.
  pub fn new() -> Self {
    return Self::default();
  }

  /// How many inserts replaced an existing entity so far.
  pub fn overwrites(&self) -> usize {
    return self.overwrites;
  }

  /// Gets a part, conjuring up an undeclared one if needed.
  fn part_entry(&mut self, pid: PartId) -> &mut Part {
    return self.model.parts
      .entry(pid)
      .or_insert_with(|| Part::undeclared(pid));
  }

  /// Inserts a record. Returns whether it replaced an existing one.
  ///
  /// On id collision the later record wins, but the entity keeps the place
  /// it had, so enumeration order is the order ids were first seen:
  ///   - nodes are replaced outright;
  ///   - an element that stays in the same part keeps its place in the part,
  ///     one that moves is taken out of the old part and appended to the new;
  ///   - a part card replaces heading and attributes, membership is left as
  ///     is since it comes from the elements.
  ///
  /// This makes loading the same data twice the same as loading it once.
  pub fn insert(&mut self, record: Record) -> bool {
    let entity = record.entity();
    let replaced = match record {
      Record::Node(node) => self.model.nodes.insert(node.id, node).is_some(),
      Record::ElementShell(element) => {
        let (eid, pid) = (element.id, element.part);
        match self.model.elements.insert(eid, element) {
          Some(old) if old.part == pid => true,
          Some(old) => {
            if let Some(p) = self.model.parts.get_mut(&old.part) {
              p.elements.retain(|e| *e != eid);
            }
            self.part_entry(pid).elements.push(eid);
            true
          },
          None => {
            self.part_entry(pid).elements.push(eid);
            false
          }
        }
      },
      Record::Part(card) => {
        let part = self.part_entry(card.id);
        let replaced = part.is_declared();
        part.heading = Some(card.heading);
        part.attributes = Some(card.attributes);
        replaced
      }
    };
    if replaced {
      debug!("Overwrote {} with a later record.", entity);
      self.overwrites += 1;
    }
    return replaced;
  }

  /// Marks the model ready for querying, checking references if asked to.
  pub fn finalize(self, check: ReferenceCheck) -> Result<MeshModel, KFileError> {
    if check == ReferenceCheck::Strict {
      self.model.check_references()?;
    }
    return Ok(self.model);
  }
}
