//! This module implements a list of the supported keyword cards and the
//! information related to them, such as the keyword names that start them and
//! decoder instantiation subroutines.

use std::fmt::Display;

use serde::{Serialize, Deserialize};

use crate::decoders::*;
use crate::fields::FieldFormat;

/// Generates the CardType enum and the keyword lookup for it.
macro_rules! gen_card_types {
  (
    $(
      {
        $desc:literal,
        $cname:ident,
        $dec:ty,
        [$(($kw:literal, $cont:literal),)+]
      },
    )*
  ) => {
    /// This contains all the supported keyword cards.
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd,
      Ord, Hash
    )]
    #[non_exhaustive]
    pub enum CardType {
      $(
        #[doc = $desc]
        $cname,
      )*
    }

    impl CardType {
      /// Returns all supported card types.
      pub const fn all() -> &'static [Self] {
        return &[ $(Self::$cname,)* ];
      }

      /// Instantiates the decoder for this card type.
      pub fn init_decoder(&self, continuation: usize) -> Box<dyn CardDecoder> {
        return match self {
          $(
            Self::$cname => Box::new(<$dec as CardDecoder>::new(continuation)),
          )*
        };
      }

      /// Returns a description of the card.
      pub const fn desc(&self) -> &'static str {
        return match self {
          $(Self::$cname => $desc,)*
        };
      }

      /// Returns the keyword names that start this card, along with the
      /// number of continuation lines each record has under that name.
      pub const fn keywords(&self) -> &'static [(&'static str, usize)] {
        return match self {
          $(Self::$cname => &[$(($kw, $cont),)+],)*
        };
      }

      /// Returns the main keyword name.
      pub const fn name(&self) -> &'static str {
        return self.keywords()[0].0;
      }

      /// Looks up an uppercase keyword name.
      pub fn from_keyword(name: &str) -> Option<(Self, usize)> {
        $(
          $(
            if name == $kw {
              return Some((Self::$cname, $cont));
            }
          )+
        )*
        return None;
      }
    }
  };
}

gen_card_types!(
  {
    "Node coordinates",
    Node,
    NodeDecoder,
    [("NODE", 0),]
  },
  {
    "Shell element connectivity",
    ElementShell,
    ShellDecoder,
    [
      ("ELEMENT_SHELL", 0),
      ("ELEMENT_SHELL_THICKNESS", 1),
      ("ELEMENT_SHELL_BETA", 1),
      ("ELEMENT_SHELL_MCID", 1),
      ("ELEMENT_SHELL_OFFSET", 1),
      ("ELEMENT_SHELL_THICKNESS_OFFSET", 2),
      ("ELEMENT_SHELL_BETA_OFFSET", 2),
      ("ELEMENT_SHELL_MCID_OFFSET", 2),
    ]
  },
  {
    "Part headings and ids",
    Part,
    PartDecoder,
    [("PART", 0),]
  },
);

/// Keywords that structure the file rather than describe the mesh. Their
/// lines are dropped, but they don't count as unsupported.
pub const CONTROL_KEYWORDS: &[&str] = &["KEYWORD", "TITLE", "END"];

impl Display for CardType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "*{}", self.name());
  }
}

/// The section a reader is in, which decides what happens to data lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Section {
  /// No keyword seen yet.
  None,
  /// Inside a supported card.
  Card {
    /// The card type.
    card: CardType,
    /// The field format of its data lines.
    format: FieldFormat,
    /// Continuation lines after each record's main line.
    continuation: usize
  },
  /// Inside a control keyword like `*KEYWORD` or `*TITLE`. Lines get dropped.
  Control(String),
  /// Inside something we don't decode. Lines get dropped.
  Skip(String)
}

impl Display for Section {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::None => write!(f, "no section"),
      Self::Card { card, format, .. } => write!(f, "{} ({:?})", card, format),
      Self::Control(name) => write!(f, "*{}", name),
      Self::Skip(name) => write!(f, "*{} (skipped)", name),
    };
  }
}

/// A keyword line, broken down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordLine {
  /// The uppercase keyword name, without format suffix.
  pub name: String,
  /// The format asked for by a suffix, if any.
  pub format: Option<FieldFormat>,
  /// Whatever came after the name, uppercased.
  pub args: Vec<String>
}

impl KeywordLine {
  /// Parses a line starting with `*`. Returns `None` for anything else.
  pub fn parse(line: &str) -> Option<Self> {
    let body = line.trim_end().strip_prefix('*')?;
    let mut tokens = body.split_whitespace();
    let mut name = tokens.next().unwrap_or("").to_ascii_uppercase();
    let mut format = name.chars().last().and_then(FieldFormat::from_suffix);
    if format.is_some() {
      name.pop();
    }
    let mut args = Vec::new();
    for tok in tokens {
      // a lone suffix separated from the name by spaces
      let mut chars = tok.chars();
      match (chars.next().and_then(FieldFormat::from_suffix), chars.next()) {
        (Some(f), None) => format = Some(f),
        _ => args.push(tok.to_ascii_uppercase()),
      }
    }
    return Some(Self { name, format, args });
  }

  /// For a `*KEYWORD` line, the default format it sets with `LONG=`.
  pub fn default_format(&self) -> Option<FieldFormat> {
    if self.name != "KEYWORD" {
      return None;
    }
    return self.args.iter().find_map(|a| match a.as_str() {
      "LONG=Y" => Some(FieldFormat::Long),
      "LONG=S" => Some(FieldFormat::Standard),
      _ => None,
    });
  }

  /// Works out the section this keyword starts.
  pub fn section(&self, default_format: FieldFormat) -> Section {
    return match CardType::from_keyword(&self.name) {
      Some((card, continuation)) => Section::Card {
        card,
        format: self.format.unwrap_or(default_format),
        continuation
      },
      None if CONTROL_KEYWORDS.contains(&self.name.as_str()) => {
        Section::Control(self.name.clone())
      },
      None => Section::Skip(self.name.clone()),
    };
  }
}
