//! This module defines the entities a keyword file describes -- nodes, shell
//! elements and parts -- along with the ids used to refer to them.

use std::fmt::Display;

use itertools::Itertools;
use nalgebra::Point3;
use serde::{Serialize, Deserialize};

/// Generates an id newtype. Saves some time.
macro_rules! gen_id {
  ($desc:literal, $tname:ident, $what:literal) => {
    #[doc = $desc]
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq,
      Eq, Hash, derive_more::From, derive_more::Into
    )]
    #[serde(transparent)]
    pub struct $tname(pub usize);

    impl $tname {
      /// What this id refers to, lowercase.
      pub const WHAT: &'static str = $what;
    }

    impl Display for $tname {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.0);
      }
    }
  };
}

gen_id!("The id of a node.", NodeId, "node");
gen_id!("The id of a shell element.", ElementId, "element");
gen_id!("The id of a part.", PartId, "part");

/// A reference to any kind of entity, used mostly for error reporting.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq,
  derive_more::From
)]
pub enum EntityRef {
  /// A node.
  Node(NodeId),
  /// A shell element.
  Element(ElementId),
  /// A part.
  Part(PartId)
}

impl Display for EntityRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::Node(id) => write!(f, "{} {}", NodeId::WHAT, id),
      Self::Element(id) => write!(f, "{} {}", ElementId::WHAT, id),
      Self::Part(id) => write!(f, "{} {}", PartId::WHAT, id),
    };
  }
}

/// A node: an id and a position.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
  /// The id.
  pub id: NodeId,
  /// The coordinates.
  pub coords: Point3<f64>,
  /// Translational constraint code, 0-7.
  pub tc: u8,
  /// Rotational constraint code, 0-7.
  pub rc: u8
}

impl Node {
  /// Creates an unconstrained node.
  pub fn new(id: NodeId, x: f64, y: f64, z: f64) -> Self {
    return Self { id, coords: Point3::new(x, y, z), tc: 0, rc: 0 };
  }
}

/// A shell element: a triangle or a quadrilateral belonging to a part.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementShell {
  /// The id.
  pub id: ElementId,
  /// The owning part.
  pub part: PartId,
  /// The corner nodes, 3 or 4 of them, in winding order.
  pub nodes: Vec<NodeId>
}

impl ElementShell {
  /// Whether this is a triangle.
  pub fn is_triangle(&self) -> bool {
    return self.nodes.len() == 3;
  }
}

impl Display for ElementShell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(
      f,
      "{} {} (part {}): [{}]",
      ElementId::WHAT,
      self.id,
      self.part,
      self.nodes.iter().join(", ")
    );
  }
}

/// The auxiliary ids on a part card. We keep them but do nothing with them.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq
)]
pub struct PartAttributes {
  /// Section id.
  pub secid: usize,
  /// Material id.
  pub mid: usize,
  /// Equation of state id.
  pub eosid: usize,
  /// Hourglass id.
  pub hgid: usize,
  /// Gravity initialization flag.
  pub grav: usize,
  /// Adaptivity flag.
  pub adpopt: usize,
  /// Thermal material id.
  pub tmid: usize
}

/// What a `*PART` card tells us about a part.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartCard {
  /// The id.
  pub id: PartId,
  /// The human-readable name.
  pub heading: String,
  /// The other ids on the card.
  pub attributes: PartAttributes
}

/// A part as stored in the model: whatever its card said, plus the elements
/// that name it, in the order they were read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
  /// The id.
  pub id: PartId,
  /// The heading, if a `*PART` card was seen for this id.
  pub heading: Option<String>,
  /// The auxiliary ids, if a `*PART` card was seen for this id.
  pub attributes: Option<PartAttributes>,
  /// The member elements.
  pub elements: Vec<ElementId>
}

impl Part {
  /// A part we only know about because some element named it.
  pub fn undeclared(id: PartId) -> Self {
    return Self { id, heading: None, attributes: None, elements: Vec::new() };
  }

  /// Whether a `*PART` card was seen for this part.
  pub fn is_declared(&self) -> bool {
    return self.heading.is_some();
  }

  /// The heading, or an empty string.
  pub fn title(&self) -> &str {
    return self.heading.as_deref().unwrap_or("");
  }
}

/// A fully decoded record, ready to go into the index.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, derive_more::From)]
pub enum Record {
  /// From a node card.
  Node(Node),
  /// From an element shell card.
  ElementShell(ElementShell),
  /// From a part card.
  Part(PartCard)
}

impl Record {
  /// What the record refers to.
  pub fn entity(&self) -> EntityRef {
    return match self {
      Self::Node(n) => n.id.into(),
      Self::ElementShell(e) => e.id.into(),
      Self::Part(p) => p.id.into(),
    };
  }
}
