//! Builds an [`FeModel`] from a keyword deck.
//!
//! Recognised cards:
//!
//! ```text
//! *MATERIAL, ID=1, NAME=Steel
//! 206000, 0.3, 7.85e-9
//! *PROPERTY, ID=1, TYPE=I, MAT=1
//! 400, 150, 150, 12, 8, 12
//! *NODE
//! 1, 0, 0, 0
//! *ELEMENT, PID=1, GROUP=deck
//! 1, 1, 2
//! ```
//!
//! Unknown cards are ignored. Ids from the deck are kept as written.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ftk_inp::{Card, Deck};
use ftk_model::{Element, FeModel, Material, Point3, Property, PropertyKind};

use crate::error::{IoError, Result};

pub fn load_deck_file(path: impl AsRef<Path>) -> Result<FeModel> {
    let raw = fs::read_to_string(path)?;
    load_deck_str(&raw)
}

pub fn load_deck_str(raw: &str) -> Result<FeModel> {
    let deck = Deck::parse_str(raw)?;
    load_deck(&deck)
}

/// Fills a fresh model from an already parsed deck. Materials and properties
/// are read before nodes and elements so card order in the file is free.
pub fn load_deck(deck: &Deck) -> Result<FeModel> {
    let mut model = FeModel::new();

    for card in deck.cards_named("MATERIAL") {
        let (id, material) = read_material(card)?;
        model.materials.add_with_id(id, material);
    }
    for card in deck.cards_named("PROPERTY") {
        let (id, property) = read_property(card)?;
        model.properties.add_with_id(id, property);
    }
    for card in deck.cards_named("NODE") {
        for line in &card.data_lines {
            let fields: Vec<f64> = line.parse_fields()?;
            let [id, x, y, z] = fields[..] else {
                return Err(IoError::at(
                    line.line,
                    format!("*NODE expects id, x, y, z; got {} fields", fields.len()),
                ));
            };
            model.nodes.add_with_id(as_id(id, line.line)?, Point3::new(x, y, z));
        }
    }
    for card in deck.cards_named("ELEMENT") {
        read_elements(card, &mut model)?;
    }

    Ok(model)
}

fn read_material(card: &Card) -> Result<(i32, Material)> {
    let id: i32 = card.require("ID")?;
    let name: String = card.require("NAME")?;
    let values: Vec<f64> = card.all_fields()?;
    let [e, nu, rho] = values[..] else {
        return Err(IoError::at(
            card.line_start,
            format!("*MATERIAL {id} expects E, nu, rho; got {} values", values.len()),
        ));
    };
    let material = Material::new(name, e, nu, rho)
        .map_err(|err| IoError::at(card.line_start, err.to_string()))?;
    Ok((id, material))
}

fn read_property(card: &Card) -> Result<(i32, Property)> {
    let id: i32 = card.require("ID")?;
    let kind: PropertyKind = card
        .require::<String>("TYPE")?
        .parse()
        .map_err(|err: ftk_model::ModelError| IoError::at(card.line_start, err.to_string()))?;
    let material_id: i32 = card.require("MAT")?;
    let dims: Vec<f64> = card.all_fields()?;
    let property = Property::new(kind, dims, material_id)
        .map_err(|err| IoError::at(card.line_start, format!("property {id}: {err}")))?;
    Ok((id, property))
}

fn read_elements(card: &Card, model: &mut FeModel) -> Result<()> {
    let pid: i32 = card.require("PID")?;
    let extra: BTreeMap<String, String> = card.other_parameters(&["PID"]).into_iter().collect();

    for line in &card.data_lines {
        let fields: Vec<i32> = line.parse_fields()?;
        let Some((&id, nodes)) = fields.split_first() else {
            continue;
        };
        let element = Element::new(nodes.to_vec(), pid, extra.clone())
            .map_err(|err| IoError::at(line.line, format!("element {id}: {err}")))?;
        model.elements.add_with_id(id, element);
    }
    Ok(())
}

fn as_id(value: f64, line: usize) -> Result<i32> {
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(IoError::at(line, format!("invalid id '{value}'")));
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: &str = r#"
** two girders meeting a post
*MATERIAL, ID=1, NAME=S355
210000, 0.3, 7.85e-9
*PROPERTY, ID=10, TYPE=I, MAT=1
400, 150, 150,
12, 8, 12
*PROPERTY, ID=11, TYPE=PBEAM, MAT=1
5000, 1.2e8, 3.4e7, 2.1e5
*NODE
1, 0, 0, 0
2, 1000, 0, 0
3, 1000, 0, 800
*ELEMENT, PID=10, GROUP=deck
1, 1, 2
*ELEMENT, PID=11
2, 2, 3
"#;

    #[test]
    fn loads_registries_with_deck_ids() {
        let model = load_deck_str(FRAME).expect("deck should load");
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.properties.ids(), vec![10, 11]);
        assert_eq!(model.nodes.len(), 3);
        assert_eq!(model.nodes.get(3).expect("node 3"), Point3::new(1000.0, 0.0, 800.0));

        let girder = model.elements.get(1).expect("element 1");
        assert_eq!(girder.node_ids(), &[1, 2]);
        assert_eq!(girder.property_id(), 10);
        assert_eq!(girder.extra().get("GROUP").map(String::as_str), Some("deck"));

        let ibeam = model.properties.get(10).expect("property 10");
        assert_eq!(ibeam.kind(), PropertyKind::I);
        assert_eq!(ibeam.dims().len(), 6);
        assert!(model.validate().is_empty());
    }

    #[test]
    fn node_row_with_missing_coordinate_reports_its_line() {
        let err = load_deck_str("*NODE\n1, 0, 0, 0\n2, 5, 5\n").expect_err("short row");
        match err {
            IoError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn repeated_element_node_is_rejected() {
        let err = load_deck_str("*ELEMENT, PID=1\n7, 4, 4\n").expect_err("degenerate element");
        match err {
            IoError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("element 7"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_property_type_is_an_error() {
        let err = load_deck_str("*PROPERTY, ID=1, TYPE=BOX, MAT=1\n1, 2\n").expect_err("BOX");
        assert!(matches!(err, IoError::Parse { line: 1, .. }));
    }

    #[test]
    fn unknown_cards_are_skipped() {
        let model = load_deck_str("*HEADING\nsome title\n*NODE\n1, 0, 0, 0\n").expect("load");
        assert_eq!(model.nodes.len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_deck_file(dir.path().join("absent.inp")).expect_err("missing file");
        assert!(matches!(err, IoError::Io(_)));
    }
}
