use std::path::{Path, PathBuf};

use nalgebra::Point3;

use crate::fields::*;
use crate::keywords::{KeywordLine, Section};
use crate::prelude::*;
use crate::reader::{CardReader, ReaderResponse};
use crate::util::{decode_int, decode_kfloat};

/// Path to a file in the test data directory.
fn fixture(name: &str) -> PathBuf {
  return Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name);
}

/// Loads the plate fixture: nodes first, then parts and elements.
fn plate() -> MeshModel {
  let files = [fixture("plate_nodes.k"), fixture("plate_mesh.k")];
  return MeshLoader::load_files(files, LoadSettings::default())
    .expect("fixtures should load")
    .0;
}

/// Loads a string with default settings.
fn load(text: &str) -> MeshModel {
  return MeshLoader::load_str(text, LoadSettings::default())
    .expect("load should succeed")
    .0;
}

/// A right-justified, standard format node line.
fn node_line(nid: usize, x: &str, y: &str, z: &str) -> String {
  return format!("{:>8}{:>16}{:>16}{:>16}", nid, x, y, z);
}

/// A right-justified, standard format shell line.
fn shell_line(fields: &[usize]) -> String {
  return fields.iter().map(|f| format!("{:>8}", f)).collect();
}

#[test]
fn test_decode_kfloat() {
  let direct = |s: &str, f: f64| assert_eq!(decode_kfloat(s), Some(f), "{}", s);
  let parsed = |s: &str| direct(s, s.parse().unwrap());
  let must_fail = |s: &str| assert_eq!(decode_kfloat(s), None, "{}", s);
  let may_fail = |s: &str, f: f64| assert_eq!(decode_kfloat(s).unwrap_or(f), f);
  // first, some "normal" cases
  let signs = ["", "+", "-"];
  let seps = ["", "e", "E", "d", "D"];
  let mantissas = ["0", "1", "0.25", ".25", "3.1415", "7."];
  let exponents = ["0", "1", "2", "3", "10"];
  for msign in signs.iter() {
    for m in mantissas.iter() {
      parsed(&format!("{}{}", msign, m));
      for sep in seps.iter() {
        for e in exponents.iter() {
          for esign in signs.iter() {
            if sep.is_empty() && esign.is_empty() { continue; }
            let kf = format!("{}{}{}{}{}", msign, m, sep, esign, e);
            let rf = format!("{}{}e{}{}", msign, m, esign, e);
            direct(&kf, rf.parse().unwrap());
          }
        }
      }
    }
  }
  // some weird zeros that we don't really care about
  for ksep in seps.iter().chain(signs.iter()).filter(|s| !s.is_empty()) {
    for msign in signs.iter() {
      may_fail(&format!("{}.{}.", msign, ksep), 0.0);
    }
  }
  // now some bad cases
  for bad in ["", "+", "-", "e", "E", "++", "--", ".", "..", "e.", ".e",
    "1.5-", "1.5e", "inf", "NaN", "1.0abc", "1.0 2.0", "1-2-3", "1e999"] {
    must_fail(bad);
  }
}

#[test]
fn abbreviated_exponent_is_exact() {
  assert_eq!(decode_kfloat("1.5-3"), Some(1.5e-3));
  assert_eq!(decode_kfloat("  -2.25+2 "), Some(-225.0));
  assert_eq!(decode_kfloat("1.5-3"), decode_kfloat("1.5e-3"));
  assert_eq!(decode_kfloat("1.5D-3"), decode_kfloat("1.5e-3"));
}

#[test]
fn test_decode_int() {
  assert_eq!(decode_int("  42 "), Some(42));
  assert_eq!(decode_int("00000007"), Some(7));
  assert_eq!(decode_int("-1"), None);
  assert_eq!(decode_int("+1"), None);
  assert_eq!(decode_int("1.0"), None);
  assert_eq!(decode_int(""), None);
  assert_eq!(decode_int("1 2"), None);
}

#[test]
fn layouts_fit_their_cards() {
  let width = |l: &[FieldSpec]| l.iter().map(|f| f.width).sum::<usize>();
  assert_eq!(width(layout(CardLayout::Node, FieldFormat::Standard)), 72);
  assert_eq!(width(layout(CardLayout::ElementShell, FieldFormat::Standard)), 80);
  assert_eq!(width(layout(CardLayout::PartIds, FieldFormat::Standard)), 80);
  assert_eq!(width(layout(CardLayout::Node, FieldFormat::LargeIds)), 78);
  assert_eq!(width(layout(CardLayout::Node, FieldFormat::Long)), 120);
  assert_eq!(width(layout(CardLayout::PartIds, FieldFormat::Long)), 160);
}

#[test]
fn full_width_fields_without_separators() {
  let (id, x, y, z) = (
    "12345678",
    "-1.23456789e+001",
    "1234567890.12345",
    "0.00000000000001"
  );
  let line = format!("{}{}{}{}", id, x, y, z);
  assert_eq!(line.len(), 56);
  let fields = SplitLine::split(&line, layout(CardLayout::Node, FieldFormat::Standard));
  assert_eq!(fields.integer(0), Ok(12345678));
  assert_eq!(fields.real(1), Ok(x.parse().unwrap()));
  assert_eq!(fields.real(2), Ok(y.parse().unwrap()));
  assert_eq!(fields.real(3), Ok(z.parse().unwrap()));
  // tc and rc are past the end, but optional
  assert_eq!(fields.real(4), Ok(0.0));
  // and the same with the abbreviated exponent filling the column
  let model = load(&format!("*NODE\n{}{}{}{}\n", id, "-1.2345678901-11", y, z));
  let node = model.node(NodeId(12345678)).unwrap();
  assert_eq!(node.coords.x, "-1.2345678901e-11".parse::<f64>().unwrap());
}

#[test]
fn short_and_blank_fields() {
  let node = layout(CardLayout::Node, FieldFormat::Standard);
  let short = SplitLine::split("       1             1.0", node);
  assert_eq!(short.real(2), Err(FieldError::TooShort("y")));
  let blank_line = node_line(1, "1.0", "", "3.0");
  let blank = SplitLine::split(&blank_line, node);
  assert_eq!(blank.real(2), Err(FieldError::Blank("y")));
  let garbage_line = node_line(1, "1.0", "one", "3.0");
  let garbage = SplitLine::split(&garbage_line, node);
  assert_eq!(garbage.real(2), Err(FieldError::NotReal("y", "one".into())));
}

#[test]
fn justification_does_not_matter() {
  let right = node_line(7, "1.25", "-2.5", "3.0e2");
  let left = format!("{:<8}{:<16}{:<16}{:<16}", 7, "1.25", "-2.5", "3.0e2");
  let centred = format!("{:^8}{:^16}{:^16}{:^16}", 7, "1.25", "-2.5", "3.0e2");
  for line in [right, left, centred] {
    let model = load(&format!("*NODE\n{}\n", line));
    assert_eq!(
      model.node_coords(NodeId(7)).unwrap(),
      Point3::new(1.25, -2.5, 300.0),
      "{}",
      line
    );
  }
}

#[test]
fn free_format_lines() {
  let model = load(
    "*NODE\n1, 1.0, 2.0, 3.0\n2,4.0,5.0,6.0\n3,0,0,0\n\
     *ELEMENT_SHELL\n10, 5, 1, 2, 3\n"
  );
  assert_eq!(model.node_coords(NodeId(2)).unwrap(), Point3::new(4.0, 5.0, 6.0));
  assert_eq!(
    model.element(ElementId(10)).unwrap().nodes,
    vec![NodeId(1), NodeId(2), NodeId(3)]
  );
}

#[test]
fn long_and_large_id_formats() {
  let long = format!("{:>20}{:>20}{:>20}{:>20}", 123456789012_usize, "1.0", "2.0", "3.0");
  // by *KEYWORD
  let model = load(&format!("*KEYWORD LONG=Y\n*NODE\n{}\n", long));
  assert_eq!(model.node_coords(NodeId(123456789012)).unwrap(), Point3::new(1.0, 2.0, 3.0));
  // by suffix, and only for that section
  let model = load(&format!(
    "*NODE +\n{}\n*NODE\n{}\n",
    long,
    node_line(5, "4.0", "5.0", "6.0")
  ));
  assert_eq!(model.node_count(), 2);
  // ten-column ids
  let big = format!(
    "{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
    1234567890_usize, 1, 1000000001, 1000000002, 1000000003, 1000000004
  );
  let model = load(&format!("*ELEMENT_SHELL %\n{}\n", big));
  let element = model.element(ElementId(1234567890)).unwrap();
  assert_eq!(element.nodes.len(), 4);
  assert_eq!(element.nodes[3], NodeId(1000000004));
}

#[test]
fn constraint_codes() {
  let ok = format!("{}{:>8}{:>8}", node_line(1, "0", "0", "0"), "3", "7.");
  let node = load(&format!("*NODE\n{}\n", ok)).node(NodeId(1)).unwrap().clone();
  assert_eq!((node.tc, node.rc), (3, 7));
  let bad = format!("{}{:>8}", node_line(1, "0", "0", "0"), "9");
  let res = MeshLoader::load_str(&format!("*NODE\n{}\n", bad), LoadSettings::default());
  assert!(matches!(res, Err(KFileError::MalformedCard { .. })));
}

#[test]
fn keyword_lines() {
  let kw = KeywordLine::parse("*node +").unwrap();
  assert_eq!(kw.name, "NODE");
  assert_eq!(kw.format, Some(FieldFormat::Long));
  let kw = KeywordLine::parse("*ELEMENT_SHELL%").unwrap();
  assert_eq!(kw.name, "ELEMENT_SHELL");
  assert_eq!(kw.format, Some(FieldFormat::LargeIds));
  let kw = KeywordLine::parse("*KEYWORD 100m long=y").unwrap();
  assert_eq!(kw.default_format(), Some(FieldFormat::Long));
  assert_eq!(KeywordLine::parse("NODE"), None);
  assert_eq!(
    CardType::from_keyword("ELEMENT_SHELL_THICKNESS"),
    Some((CardType::ElementShell, 1))
  );
  assert_eq!(CardType::from_keyword("ELEMENT_SOLID"), None);
}

#[test]
fn reader_state_machine() {
  let mut reader = CardReader::default();
  assert_eq!(reader.consume("$ a comment"), ReaderResponse::Comment);
  assert_eq!(reader.consume("   \r"), ReaderResponse::Blank);
  assert_eq!(reader.consume("       1     0.0"), ReaderResponse::Dropped);
  assert!(matches!(
    reader.consume("*NODE"),
    ReaderResponse::BeginSection(Section::Card { card: CardType::Node, .. })
  ));
  let data = node_line(1, "0.0", "0.0", "0.0") + "   \r";
  match reader.consume(&data) {
    ReaderResponse::Data(line) => {
      assert_eq!(line.card, CardType::Node);
      assert_eq!(line.line, 5);
      assert_eq!(line.text, data.trim_end());
      assert!(line.text.starts_with("       1"));
    },
    other => panic!("expected data, got {:?}", other),
  }
  // blank lines in a card section are blank cards
  match reader.consume("  ") {
    ReaderResponse::Data(line) => assert_eq!((line.line, line.text), (6, "")),
    other => panic!("expected a blank card, got {:?}", other),
  }
  assert_eq!(
    reader.consume("*DEFINE_CURVE"),
    ReaderResponse::BeginSection(Section::Skip("DEFINE_CURVE".into()))
  );
  assert_eq!(reader.consume("1, 2"), ReaderResponse::Dropped);
  assert_eq!(reader.consume(""), ReaderResponse::Blank);
  assert_eq!(reader.skipped_keywords().get("DEFINE_CURVE"), Some(&1));
  assert_eq!(
    reader.consume("*END"),
    ReaderResponse::BeginSection(Section::Control("END".into()))
  );
  assert!(!reader.skipped_keywords().contains_key("END"));
  assert_eq!(reader.total_lines(), 10);
}

#[test]
fn unsupported_cards_are_skipped() {
  let text = format!(
    "*KEYWORD\n*TITLE\nsome model\n*MAT_ELASTIC\n{}\n*NODE\n{}\n*ELEMENT_SOLID\n{}\n",
    node_line(1, "9.0", "9.0", "9.0"),
    node_line(2, "1.0", "1.0", "1.0"),
    shell_line(&[1, 1, 1, 2, 3, 4, 5, 6, 7, 8])
  );
  let (model, report) = MeshLoader::load_str(&text, LoadSettings::default()).unwrap();
  assert_eq!(model.node_count(), 1);
  assert_eq!(model.element_count(), 0);
  assert_eq!(report.unsupported_keywords.get("MAT_ELASTIC"), Some(&1));
  assert_eq!(report.unsupported_keywords.get("ELEMENT_SOLID"), Some(&1));
  // structural keywords aren't unsupported
  assert!(!report.unsupported_keywords.contains_key("KEYWORD"));
  assert!(!report.unsupported_keywords.contains_key("TITLE"));
  let (_, report) = MeshLoader::load_str("*KEYWORD
*END
", LoadSettings::default())
    .unwrap();
  assert!(report.unsupported_keywords.is_empty());
}

#[test]
fn shell_corners() {
  let text = format!(
    "*ELEMENT_SHELL\n{}\n{}\n{}\n",
    shell_line(&[1, 1, 11, 12, 13, 14]),
    shell_line(&[2, 1, 11, 12, 13]),
    shell_line(&[3, 1, 11, 12, 13, 0, 0, 0, 0, 0])
  );
  let model = load(&text);
  assert!(!model.element(ElementId(1)).unwrap().is_triangle());
  assert!(model.element(ElementId(2)).unwrap().is_triangle());
  assert!(model.element(ElementId(3)).unwrap().is_triangle());
  // mid-side nodes don't count
  let model = load(&format!(
    "*ELEMENT_SHELL\n{}\n",
    shell_line(&[4, 1, 1, 2, 3, 4, 5, 6, 7, 8])
  ));
  assert_eq!(model.element(ElementId(4)).unwrap().nodes.len(), 4);
  // gaps and too few nodes are not fine
  for bad in [shell_line(&[5, 1, 11, 0, 13, 14]), shell_line(&[6, 1, 11, 12])] {
    let res = MeshLoader::load_str(
      &format!("*ELEMENT_SHELL\n{}\n", bad),
      LoadSettings::default()
    );
    assert!(matches!(res, Err(KFileError::MalformedCard { .. })), "{}", bad);
  }
}

#[test]
fn shell_continuation_lines() {
  let thickness = format!("{:>16}{:>16}{:>16}{:>16}", "0.5", "0.5", "0.5", "0.5");
  let text = format!(
    "*ELEMENT_SHELL_THICKNESS\n{}\n{}\n{}\n{}\n",
    shell_line(&[1, 1, 1, 2, 3, 4]),
    thickness,
    shell_line(&[2, 1, 2, 3, 4]),
    thickness
  );
  let model = load(&text);
  assert_eq!(model.element_count(), 2);
  // a missing continuation line is caught when the section ends
  let text = format!(
    "*ELEMENT_SHELL_BETA\n{}\n*NODE\n",
    shell_line(&[1, 1, 1, 2, 3, 4])
  );
  let res = MeshLoader::load_str(&text, LoadSettings::default());
  assert!(matches!(res, Err(KFileError::MalformedCard { card: CardType::ElementShell, .. })));
}

#[test]
fn blank_cards_hold_their_place() {
  let thickness = format!("{:>16}", "0.5");
  let text = format!(
    "*NODE\n{}\n\n{}\n*ELEMENT_SHELL_THICKNESS\n{}\n\n{}\n{}\n",
    node_line(1, "0", "0", "0"),
    node_line(2, "1", "0", "0"),
    shell_line(&[1, 1, 1, 2, 3, 4]),
    shell_line(&[2, 1, 2, 3, 4]),
    thickness
  );
  let model = load(&text);
  assert_eq!(model.node_count(), 2);
  assert_eq!(model.element_count(), 2);
  assert!(model.element(ElementId(2)).unwrap().is_triangle());
  // an untitled part, and a blank line at the end of the section
  let text = format!(
    "*PART\n\n{:>10}{:>10}{:>10}\n*PART\nNamed\n{:>10}\n\n*END\n",
    1, 1, 1, 2
  );
  let model = load(&text);
  let untitled = model.part_info(PartId(1)).unwrap();
  assert!(untitled.is_declared());
  assert_eq!(untitled.title(), "");
  assert_eq!(untitled.attributes.unwrap().mid, 1);
  assert_eq!(model.part_info(PartId(2)).unwrap().title(), "Named");
  assert_eq!(model.part_count(), 2);
}

#[test]
fn shell_offset_variants() {
  let card = |v: &str| format!("{:>16}", v);
  let text = format!(
    "*ELEMENT_SHELL_OFFSET\n{}\n{}\n\
     *ELEMENT_SHELL_BETA_OFFSET\n{}\n{}\n{}\n{}\n{}\n{}\n",
    shell_line(&[1, 1, 1, 2, 3, 4]),
    card("0.1"),
    shell_line(&[2, 1, 1, 2, 3]),
    card("0.5"),
    card("0.1"),
    shell_line(&[3, 1, 1, 2, 3]),
    card("0.5"),
    card("0.1")
  );
  let (model, report) = MeshLoader::load_str(&text, LoadSettings::default()).unwrap();
  assert_eq!(model.element_count(), 3);
  assert!(report.unsupported_keywords.is_empty());
  assert_eq!(
    CardType::from_keyword("ELEMENT_SHELL_THICKNESS_OFFSET"),
    Some((CardType::ElementShell, 2))
  );
  assert_eq!(
    CardType::from_keyword("ELEMENT_SHELL_MCID_OFFSET"),
    Some((CardType::ElementShell, 2))
  );
}

#[test]
fn part_cards() {
  let text = "*PART\nLeft door, outer panel\n         7         1         3\n\
              Roof\n        11         2         4         0         1\n";
  let model = load(text);
  let door = model.part_info(PartId(7)).unwrap();
  assert_eq!(door.title(), "Left door, outer panel");
  assert_eq!(door.attributes.unwrap().mid, 3);
  let roof = model.part_info(PartId(11)).unwrap();
  assert_eq!(roof.attributes.unwrap().hgid, 1);
  assert!(roof.elements.is_empty());
  // a heading with no id line
  let res = MeshLoader::load_str("*PART\nLonely\n", LoadSettings::default());
  assert!(matches!(res, Err(KFileError::MalformedCard { card: CardType::Part, .. })));
}

#[test]
fn spec_example_nodes() {
  let model = load(&format!(
    "*NODE\n{}\n{}\n",
    node_line(100000, "1.0", "2.0", "3.0"),
    node_line(100001, "4.0", "5.0", "6.0")
  ));
  assert_eq!(
    model.nodes(&[NodeId(100000), NodeId(100001)]).unwrap(),
    vec![Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)]
  );
  assert_eq!(model.element_count(), 0);
}

#[test]
fn node_queries() {
  let model = plate();
  assert_eq!(model.node_count(), 7);
  assert_eq!(
    model.node_coords(NodeId(107)).unwrap(),
    Point3::new(1.0, 2.0, "1.5e-3".parse().unwrap())
  );
  let ids = [NodeId(106), NodeId(101), NodeId(106)];
  let coords = model.nodes(&ids).unwrap();
  assert_eq!(coords.len(), ids.len());
  for (nid, c) in ids.iter().zip(coords.iter()) {
    assert_eq!(model.node_coords(*nid).unwrap(), *c);
  }
  assert_eq!(model.all_nodes().len(), 7);
  assert_eq!(model.all_nodes()[0], Point3::origin());
  // fail fast, on the first missing one
  assert!(matches!(
    model.nodes(&[NodeId(101), NodeId(999), NodeId(998)]),
    Err(KFileError::NotFound(EntityRef::Node(NodeId(999))))
  ));
  assert!(matches!(model.node(NodeId(1)), Err(KFileError::NotFound(_))));
}

#[test]
fn element_queries() {
  let model = plate();
  assert_eq!(model.element_count(), 3);
  let indices = model.element_indices(ElementId(1)).unwrap();
  assert_eq!(indices, vec![0, 1, 4, 3]);
  let all = model.all_nodes();
  let element = model.element(ElementId(1)).unwrap();
  for (p, nid) in indices.iter().zip(element.nodes.iter()) {
    assert_eq!(all[*p], model.node_coords(*nid).unwrap());
  }
  assert_eq!(
    model.element_shell(ElementId(3), OutputMode::Coordinates).unwrap(),
    ElementGeometry::Coordinates(vec![
      Point3::new(0.0, 1.0, 0.0),
      Point3::new(1.0, 1.0, 0.0),
      Point3::new(1.0, 2.0, 1.5e-3),
    ])
  );
  assert_eq!(
    model.element_shell(ElementId(3), OutputMode::Indices).unwrap(),
    ElementGeometry::Indices(vec![3, 4, 6])
  );
  assert!(matches!(
    model.element_shell(ElementId(42), OutputMode::Indices),
    Err(KFileError::NotFound(EntityRef::Element(ElementId(42))))
  ));
}

#[test]
fn part_queries() {
  let model = plate();
  assert_eq!(model.part_count(), 2);
  let plate = model.part(PartId(1), OutputMode::Coordinates).unwrap();
  let members = &model.part_info(PartId(1)).unwrap().elements;
  assert_eq!(plate.len(), members.len());
  for (geometry, eid) in plate.iter().zip(members.iter()) {
    assert_eq!(
      *geometry,
      model.element_shell(*eid, OutputMode::Coordinates).unwrap()
    );
  }
  let cap = model.part_info(PartId(2)).unwrap();
  assert_eq!(cap.title(), "Cap");
  assert_eq!(cap.attributes.unwrap().mid, 2);
  let all = model.all_parts(OutputMode::Indices).unwrap();
  assert_eq!(all.iter().map(|(pid, _)| *pid).collect::<Vec<_>>(), [PartId(1), PartId(2)]);
  assert_eq!(all[1].1, vec![ElementGeometry::Indices(vec![3, 4, 6])]);
  assert!(matches!(
    model.part(PartId(3), OutputMode::Coordinates),
    Err(KFileError::NotFound(EntityRef::Part(PartId(3))))
  ));
}

#[test]
fn shared_mesh() {
  let model = plate();
  let mesh = model.shared_mesh(None).unwrap();
  assert_eq!(mesh.vertices, model.all_nodes());
  assert_eq!(mesh.node_ids.len(), mesh.vertices.len());
  assert_eq!(mesh.faces.len(), 3);
  let cap = model.shared_mesh(Some(PartId(2))).unwrap();
  assert_eq!(cap.faces, vec![Face {
    element: ElementId(3),
    part: PartId(2),
    vertices: vec![3, 4, 6]
  }]);
}

#[test]
fn dangling_references() {
  // elements but no nodes
  let files = [fixture("plate_mesh.k")];
  let (model, _) = MeshLoader::load_files(files.clone(), LoadSettings::default()).unwrap();
  assert!(matches!(
    model.element_shell(ElementId(1), OutputMode::Coordinates),
    Err(KFileError::DanglingReference {
      from: EntityRef::Element(ElementId(1)),
      missing: EntityRef::Node(NodeId(101))
    })
  ));
  assert!(matches!(
    model.part(PartId(2), OutputMode::Indices),
    Err(KFileError::DanglingReference { .. })
  ));
  // strict loads find out right away
  let strict = LoadSettings { references: ReferenceCheck::Strict, ..Default::default() };
  assert!(matches!(
    MeshLoader::load_files(files, strict),
    Err(KFileError::DanglingReference { .. })
  ));
  // a part only elements talk about
  let text = format!(
    "*NODE\n{}\n{}\n{}\n*ELEMENT_SHELL\n{}\n",
    node_line(1, "0", "0", "0"),
    node_line(2, "1", "0", "0"),
    node_line(3, "0", "1", "0"),
    shell_line(&[1, 9, 1, 2, 3])
  );
  let model = load(&text);
  assert!(!model.part_info(PartId(9)).unwrap().is_declared());
  assert_eq!(model.part(PartId(9), OutputMode::Indices).unwrap().len(), 1);
  assert!(matches!(
    MeshLoader::load_str(&text, strict),
    Err(KFileError::DanglingReference { missing: EntityRef::Part(PartId(9)), .. })
  ));
  assert!(plate().check_references().is_ok());
}

#[test]
fn overwrites_keep_their_place() {
  let text = format!(
    "*NODE\n{}\n{}\n{}\n",
    node_line(1, "1.0", "1.0", "1.0"),
    node_line(2, "2.0", "2.0", "2.0"),
    node_line(1, "3.0", "3.0", "3.0")
  );
  let (model, report) = MeshLoader::load_str(&text, LoadSettings::default()).unwrap();
  assert_eq!(
    model.all_nodes(),
    vec![Point3::new(3.0, 3.0, 3.0), Point3::new(2.0, 2.0, 2.0)]
  );
  assert_eq!(report.overwrites, 1);
  assert_eq!(report.records, 3);
}

#[test]
fn element_overwrites_and_membership() {
  let text = format!(
    "*ELEMENT_SHELL\n{}\n{}\n{}\n{}\n*PART\nFirst\n{:>10}\n*PART\nSecond\n{:>10}\n",
    shell_line(&[1, 1, 1, 2, 3]),
    shell_line(&[2, 1, 1, 2, 3]),
    shell_line(&[2, 1, 4, 5, 6]),
    shell_line(&[1, 2, 1, 2, 3, 4]),
    1,
    1
  );
  let (model, report) = MeshLoader::load_str(&text, LoadSettings::default()).unwrap();
  assert_eq!(report.overwrites, 3);
  assert_eq!(model.part_info(PartId(1)).unwrap().elements, vec![ElementId(2)]);
  assert_eq!(model.part_info(PartId(2)).unwrap().elements, vec![ElementId(1)]);
  assert_eq!(
    model.element(ElementId(2)).unwrap().nodes,
    vec![NodeId(4), NodeId(5), NodeId(6)]
  );
  // the later part card wins, membership stays
  assert_eq!(model.part_info(PartId(1)).unwrap().title(), "Second");
  let order: Vec<ElementId> = model.iter_elements().map(|e| e.id).collect();
  assert_eq!(order, vec![ElementId(1), ElementId(2)]);
}

#[test]
fn loading_twice_changes_nothing() {
  let once = plate();
  let files = [
    fixture("plate_nodes.k"),
    fixture("plate_mesh.k"),
    fixture("plate_nodes.k"),
    fixture("plate_mesh.k"),
  ];
  let (twice, report) = MeshLoader::load_files(files, LoadSettings::default()).unwrap();
  assert_eq!(once, twice);
  assert!(once.iter_nodes().map(|n| n.id).eq(twice.iter_nodes().map(|n| n.id)));
  assert!(once.iter_elements().eq(twice.iter_elements()));
  assert!(once.iter_parts().eq(twice.iter_parts()));
  assert_eq!(report.overwrites, 7 + 3 + 2);
}

#[test]
fn sections_carry_across_sources() {
  let mut loader = MeshLoader::new(LoadSettings::default());
  let first = format!("*NODE\n{}\n*PART\nSplit\n", node_line(1, "0", "0", "0"));
  let second = format!("{:>10}\n", 4);
  let third = format!("{}\n", node_line(2, "1", "1", "1"));
  loader.read_bufread(first.as_bytes(), "first.k").unwrap();
  loader.read_bufread(second.as_bytes(), "second.k").unwrap();
  loader.read_bufread(format!("*NODE\n{}", third).as_bytes(), "third.k").unwrap();
  let (model, report) = loader.finish().unwrap();
  assert_eq!(model.part_info(PartId(4)).unwrap().title(), "Split");
  assert_eq!(model.node_count(), 2);
  assert_eq!(report.sources, ["first.k", "second.k", "third.k"]);
  assert_eq!(report.lines, 7);
}

#[test]
fn malformed_lines_abort_or_skip() {
  let text = format!(
    "*NODE\n{}\n{}\n{}\n",
    node_line(1, "0.0", "0.0", "0.0"),
    node_line(2, "0.0", "zero", "0.0"),
    node_line(3, "0.0", "0.0", "0.0")
  );
  match MeshLoader::load_bufread(text.as_bytes(), "bad.k", LoadSettings::default()) {
    Err(KFileError::MalformedCard { location, card, reason }) => {
      assert_eq!(&*location.source, "bad.k");
      assert_eq!(location.line, 3);
      assert_eq!(card, CardType::Node);
      assert!(reason.contains("zero"), "{}", reason);
    },
    other => panic!("expected a malformed card, got {:?}", other.map(|r| r.1)),
  }
  let skip = LoadSettings { on_malformed: MalformedPolicy::Skip, ..Default::default() };
  let (model, report) = MeshLoader::load_str(&text, skip).unwrap();
  assert_eq!(model.node_count(), 2);
  assert_eq!(report.skipped_lines, 1);
  // zero ids are malformed too
  let res = MeshLoader::load_str(
    &format!("*NODE\n{}\n", node_line(0, "0", "0", "0")),
    LoadSettings::default()
  );
  assert!(matches!(res, Err(KFileError::MalformedCard { .. })));
}

#[test]
fn missing_files() {
  let res = MeshLoader::load_files([fixture("nope.k")], LoadSettings::default());
  match res {
    Err(KFileError::Io { source_name, .. }) => assert!(source_name.ends_with("nope.k")),
    other => panic!("expected an I/O error, got {:?}", other.map(|r| r.1)),
  }
}

#[test]
fn directory_listing() {
  let found = find_keyword_files(Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata"))
    .unwrap();
  let names: Vec<_> = found.iter()
    .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
    .collect();
  assert_eq!(names, ["plate_mesh.k", "plate_nodes.k"]);
}

#[test]
fn concurrent_readers() {
  let model = plate();
  std::thread::scope(|s| {
    for pid in [PartId(1), PartId(2), PartId(1), PartId(2)] {
      let model = &model;
      s.spawn(move || {
        let expected = model.part_info(pid).unwrap().elements.len();
        assert_eq!(model.part(pid, OutputMode::Indices).unwrap().len(), expected);
      });
    }
  });
}
