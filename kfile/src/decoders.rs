//! This module implements the decoders for the supported cards. A decoder
//! lives for as long as its section does, and turns tagged data lines into
//! records.

use crate::entities::*;
use crate::error::{KFileError, Location};
use crate::fields::*;
use crate::keywords::CardType;
use crate::reader::CardLine;

/// Shell node columns we read. Further ones are mid-side nodes.
const SHELL_CORNERS: usize = 4;

/// Index of the first node field in a shell layout.
const SHELL_FIRST_NODE: usize = 2;

/// All card decoders must implement this trait.
pub trait CardDecoder {
  /// Creates the decoder. Records may span `continuation` extra lines.
  fn new(continuation: usize) -> Self where Self: Sized;

  /// The type of card this decodes.
  fn card_type(&self) -> CardType;

  /// Consumes a data line. Returns a record if the line completed one.
  fn consume(&mut self, line: &CardLine) -> Result<Option<Record>, KFileError>;

  /// Called when the section ends. Complains about unfinished records.
  fn finish(&mut self) -> Result<(), KFileError>;
}

/// Makes a malformed card error.
fn malformed(
  location: Location,
  card: CardType,
  reason: impl ToString
) -> KFileError {
  return KFileError::MalformedCard {
    location,
    card,
    reason: reason.to_string()
  };
}

/// Wraps a field error with the line it happened on.
fn field_err<'l>(
  line: &'l CardLine<'l>
) -> impl Fn(FieldError) -> KFileError + 'l {
  return move |e| malformed(line.location(), line.card, e);
}

/// Checks an id is positive.
fn positive(line: &CardLine, name: &str, id: usize) -> Result<usize, KFileError> {
  if id == 0 {
    return Err(malformed(line.location(), line.card, format!("{} is zero", name)));
  }
  return Ok(id);
}

/// Decodes a constraint code, which is written as a real but must be 0-7.
fn constraint_code(line: &CardLine, name: &str, val: f64) -> Result<u8, KFileError> {
  if val.fract() != 0.0 || !(0.0..=7.0).contains(&val) {
    return Err(malformed(
      line.location(),
      line.card,
      format!("{} must be an integer from 0 to 7, got {}", name, val)
    ));
  }
  return Ok(val as u8);
}

/// This decodes node lines.
pub(crate) struct NodeDecoder;

impl CardDecoder for NodeDecoder {
  fn new(_continuation: usize) -> Self {
    return Self;
  }

  fn card_type(&self) -> CardType {
    return CardType::Node;
  }

  fn consume(&mut self, line: &CardLine) -> Result<Option<Record>, KFileError> {
    if line.text.is_empty() {
      return Ok(None);
    }
    let fields = SplitLine::split(
      line.text,
      layout(CardLayout::Node, line.format)
    );
    let err = field_err(line);
    let nid = positive(line, "nid", fields.integer(0).map_err(&err)?)?;
    let x = fields.real(1).map_err(&err)?;
    let y = fields.real(2).map_err(&err)?;
    let z = fields.real(3).map_err(&err)?;
    let tc = constraint_code(line, "tc", fields.real(4).map_err(&err)?)?;
    let rc = constraint_code(line, "rc", fields.real(5).map_err(&err)?)?;
    let mut node = Node::new(nid.into(), x, y, z);
    node.tc = tc;
    node.rc = rc;
    return Ok(Some(node.into()));
  }

  fn finish(&mut self) -> Result<(), KFileError> {
    return Ok(());
  }
}

/// This decodes shell element lines, skipping continuation lines.
pub(crate) struct ShellDecoder {
  /// Continuation lines per element.
  continuation: usize,
  /// Continuation lines still expected for the last element, and where it was.
  pending: Option<(usize, Location)>
}

impl ShellDecoder {
  /// Works out the corner nodes from the node fields. Trailing blanks or
  /// zeroes are dropped, a gap before a real node isn't allowed.
  fn corners(
    line: &CardLine,
    fields: &SplitLine
  ) -> Result<Vec<NodeId>, KFileError> {
    let err = field_err(line);
    let mut ids = Vec::with_capacity(SHELL_CORNERS);
    for i in SHELL_FIRST_NODE..SHELL_FIRST_NODE+SHELL_CORNERS {
      ids.push(fields.integer(i).map_err(&err)?);
    }
    while ids.last() == Some(&0) {
      ids.pop();
    }
    if ids.len() < 3 {
      return Err(malformed(
        line.location(),
        line.card,
        format!("a shell needs at least 3 nodes, got {}", ids.len())
      ));
    }
    if ids.contains(&0) {
      return Err(malformed(
        line.location(),
        line.card,
        "zero node id before the last corner"
      ));
    }
    return Ok(ids.into_iter().map(NodeId::from).collect());
  }
}

impl CardDecoder for ShellDecoder {
  fn new(continuation: usize) -> Self {
    return Self { continuation, pending: None };
  }

  fn card_type(&self) -> CardType {
    return CardType::ElementShell;
  }

  fn consume(&mut self, line: &CardLine) -> Result<Option<Record>, KFileError> {
    // continuation lines carry thickness and the like, which we ignore; a
    // blank one is all defaults
    if let Some((left, loc)) = self.pending.take() {
      if left > 1 {
        self.pending = Some((left - 1, loc));
      }
      return Ok(None);
    }
    if line.text.is_empty() {
      return Ok(None);
    }
    let fields = SplitLine::split(
      line.text,
      layout(CardLayout::ElementShell, line.format)
    );
    let err = field_err(line);
    let eid = positive(line, "eid", fields.integer(0).map_err(&err)?)?;
    let pid = positive(line, "pid", fields.integer(1).map_err(&err)?)?;
    let nodes = Self::corners(line, &fields)?;
    if self.continuation > 0 {
      self.pending = Some((self.continuation, line.location()));
    }
    return Ok(Some(ElementShell {
      id: eid.into(),
      part: pid.into(),
      nodes
    }.into()));
  }

  fn finish(&mut self) -> Result<(), KFileError> {
    if let Some((left, loc)) = self.pending.take() {
      return Err(malformed(
        loc,
        CardType::ElementShell,
        format!("section ended {} continuation line(s) short", left)
      ));
    }
    return Ok(());
  }
}

/// This decodes part cards: a heading line followed by an id line, as many
/// times as the section wants. A blank heading is a part without a title.
pub(crate) struct PartDecoder {
  /// The heading waiting for its id line, and where it was.
  heading: Option<(String, Location)>
}

impl CardDecoder for PartDecoder {
  fn new(_continuation: usize) -> Self {
    return Self { heading: None };
  }

  fn card_type(&self) -> CardType {
    return CardType::Part;
  }

  fn consume(&mut self, line: &CardLine) -> Result<Option<Record>, KFileError> {
    let heading = match self.heading.take() {
      Some((heading, _)) => heading,
      None => {
        // headings are free text, so commas don't mean free format here
        let fields = SplitLine::split_fixed(
          line.text,
          layout(CardLayout::PartHeading, line.format)
        );
        let text = fields.text(0).map_err(field_err(line))?;
        self.heading = Some((text.to_string(), line.location()));
        return Ok(None);
      }
    };
    let fields = SplitLine::split(
      line.text,
      layout(CardLayout::PartIds, line.format)
    );
    let err = field_err(line);
    let pid = positive(line, "pid", fields.integer(0).map_err(&err)?)?;
    let attributes = PartAttributes {
      secid: fields.integer(1).map_err(&err)?,
      mid: fields.integer(2).map_err(&err)?,
      eosid: fields.integer(3).map_err(&err)?,
      hgid: fields.integer(4).map_err(&err)?,
      grav: fields.integer(5).map_err(&err)?,
      adpopt: fields.integer(6).map_err(&err)?,
      tmid: fields.integer(7).map_err(&err)?,
    };
    return Ok(Some(PartCard { id: pid.into(), heading, attributes }.into()));
  }

  fn finish(&mut self) -> Result<(), KFileError> {
    if let Some((heading, loc)) = self.heading.take() {
      // a trailing blank line, not a part
      if heading.is_empty() {
        return Ok(());
      }
      return Err(malformed(
        loc,
        CardType::Part,
        format!("heading \"{}\" has no id line", heading)
      ));
    }
    return Ok(());
  }
}
