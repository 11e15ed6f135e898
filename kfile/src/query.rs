//! This module implements the read API over a finished mesh model. Every
//! operation here borrows the model and leaves it untouched, so a model can
//! be queried from as many threads as one likes.

use clap::ValueEnum;
use itertools::Itertools;
use nalgebra::Point3;
use serde::{Serialize, Deserialize};

use crate::entities::*;
use crate::error::KFileError;
use crate::mesh::MeshModel;

/// How to express the geometry of an element.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum
)]
pub enum OutputMode {
  /// The coordinates of each corner node.
  #[default]
  Coordinates,
  /// The position of each corner node in [`MeshModel::all_nodes`], so that
  /// consumers can share a single vertex buffer.
  Indices
}

/// The geometry of one element, in the shape its output mode asks for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ElementGeometry {
  /// Corner coordinates, in winding order.
  Coordinates(Vec<Point3<f64>>),
  /// Corner positions in the node enumeration, in winding order.
  Indices(Vec<usize>)
}

impl ElementGeometry {
  /// The number of corners.
  pub fn len(&self) -> usize {
    return match self {
      Self::Coordinates(v) => v.len(),
      Self::Indices(v) => v.len(),
    };
  }

  /// Whether there are no corners, which never happens for a real element.
  pub fn is_empty(&self) -> bool {
    return self.len() == 0;
  }
}

/// One face of a shared mesh.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Face {
  /// The element it comes from.
  pub element: ElementId,
  /// The part of that element.
  pub part: PartId,
  /// Positions in the vertex buffer.
  pub vertices: Vec<usize>
}

/// A vertex buffer plus faces indexing into it -- what a renderer wants.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SharedMesh {
  /// The ids of the vertices, same order as `vertices`.
  pub node_ids: Vec<NodeId>,
  /// Every node in the model.
  pub vertices: Vec<Point3<f64>>,
  /// The faces.
  pub faces: Vec<Face>
}

impl MeshModel {
  /// Number of nodes.
  pub fn node_count(&self) -> usize {
    return self.nodes.len();
  }

  /// Number of shell elements.
  pub fn element_count(&self) -> usize {
    return self.elements.len();
  }

  /// Number of parts, declared or not.
  pub fn part_count(&self) -> usize {
    return self.parts.len();
  }

  /// Returns a node.
  pub fn node(&self, nid: NodeId) -> Result<&Node, KFileError> {
    return self.nodes.get(&nid).ok_or(KFileError::NotFound(nid.into()));
  }

  /// Returns the coordinates of a node.
  pub fn node_coords(&self, nid: NodeId) -> Result<Point3<f64>, KFileError> {
    return Ok(self.node(nid)?.coords);
  }

  /// Returns the coordinates of several nodes, in the order asked. Fails on
  /// the first one that isn't there.
  pub fn nodes(&self, nids: &[NodeId]) -> Result<Vec<Point3<f64>>, KFileError> {
    return nids.iter().map(|nid| self.node_coords(*nid)).collect();
  }

  /// Returns the coordinates of every node, in enumeration order.
  pub fn all_nodes(&self) -> Vec<Point3<f64>> {
    return self.nodes.values().map(|n| n.coords).collect_vec();
  }

  /// Iterates over the nodes in enumeration order.
  pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
    return self.nodes.values();
  }

  /// Returns the position of a node in [`Self::all_nodes`].
  pub fn node_index(&self, nid: NodeId) -> Result<usize, KFileError> {
    return self.nodes.get_index_of(&nid)
      .ok_or(KFileError::NotFound(nid.into()));
  }

  /// Returns a shell element.
  pub fn element(&self, eid: ElementId) -> Result<&ElementShell, KFileError> {
    return self.elements.get(&eid).ok_or(KFileError::NotFound(eid.into()));
  }

  /// Iterates over the shell elements in enumeration order.
  pub fn iter_elements(&self) -> impl Iterator<Item = &ElementShell> {
    return self.elements.values();
  }

  /// Resolves each corner of an element with a function, turning missing
  /// nodes into dangling references.
  fn resolve<T, F>(&self, eid: ElementId, f: F) -> Result<Vec<T>, KFileError>
    where F: Fn(NodeId) -> Result<T, KFileError> {
    let element = self.element(eid)?;
    return element.nodes.iter()
      .map(|nid| f(*nid).map_err(|_| KFileError::DanglingReference {
        from: eid.into(),
        missing: (*nid).into()
      }))
      .collect();
  }

  /// Returns the corner coordinates of an element, in winding order.
  pub fn element_coordinates(
    &self,
    eid: ElementId
  ) -> Result<Vec<Point3<f64>>, KFileError> {
    return self.resolve(eid, |nid| self.node_coords(nid));
  }

  /// Returns the corner positions of an element in [`Self::all_nodes`], in
  /// winding order.
  pub fn element_indices(&self, eid: ElementId) -> Result<Vec<usize>, KFileError> {
    return self.resolve(eid, |nid| self.node_index(nid));
  }

  /// Returns the geometry of an element in the given mode.
  pub fn element_shell(
    &self,
    eid: ElementId,
    mode: OutputMode
  ) -> Result<ElementGeometry, KFileError> {
    return Ok(match mode {
      OutputMode::Coordinates => {
        ElementGeometry::Coordinates(self.element_coordinates(eid)?)
      },
      OutputMode::Indices => ElementGeometry::Indices(self.element_indices(eid)?),
    });
  }

  /// Returns a part.
  pub fn part_info(&self, pid: PartId) -> Result<&Part, KFileError> {
    return self.parts.get(&pid).ok_or(KFileError::NotFound(pid.into()));
  }

  /// Iterates over the parts in enumeration order.
  pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
    return self.parts.values();
  }

  /// Returns the geometry of every element in a part, in part order.
  pub fn part(
    &self,
    pid: PartId,
    mode: OutputMode
  ) -> Result<Vec<ElementGeometry>, KFileError> {
    return self.part_info(pid)?
      .elements
      .iter()
      .map(|eid| self.element_shell(*eid, mode))
      .collect();
  }

  /// Returns the geometry of every part, in enumeration order.
  pub fn all_parts(
    &self,
    mode: OutputMode
  ) -> Result<Vec<(PartId, Vec<ElementGeometry>)>, KFileError> {
    return self.parts.keys()
      .map(|pid| Ok((*pid, self.part(*pid, mode)?)))
      .collect();
  }

  /// Builds a shared mesh out of one part, or all of them. The vertex buffer
  /// always holds every node so indices match [`Self::all_nodes`].
  pub fn shared_mesh(&self, pid: Option<PartId>) -> Result<SharedMesh, KFileError> {
    let parts: Vec<&Part> = match pid {
      Some(pid) => vec![self.part_info(pid)?],
      None => self.parts.values().collect(),
    };
    let mut faces = Vec::new();
    for part in parts {
      for eid in part.elements.iter() {
        faces.push(Face {
          element: *eid,
          part: part.id,
          vertices: self.element_indices(*eid)?
        });
      }
    }
    return Ok(SharedMesh {
      node_ids: self.nodes.keys().copied().collect(),
      vertices: self.all_nodes(),
      faces
    });
  }
}
