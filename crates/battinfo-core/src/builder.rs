//! Structural builder: applies one schema row to the in-progress document.
//!
//! A row walks its ontology link from the document root, creating nodes as
//! it goes, and ends in exactly one of three attachments:
//!
//! * a unit-bearing row attaches a quantity object at the second-to-last key;
//! * a `No Unit` row whose value is a known term attaches `@id` and `@type`;
//! * any other `No Unit` row attaches its value as `rdfs:comment`.

use serde::Serialize;

use crate::config::Settings;
use crate::node::{
    Node, NodeConflict, Scalar, COMMENT_KEY, ID_KEY, MEASUREMENT_UNIT_KEY, NUMBER_VALUE_KEY,
    NUMERICAL_PART_KEY,
};
use crate::path::{display_path, parse_path, PathError, Segment};
use crate::registry::{row_tokens, NodeRegistry, Tokens, SELF_SLOT};
use crate::tables::LookupTables;
use crate::ConvertError;

/// Unit cell sentinel for dimensionless / textual values.
pub const NO_UNIT: &str = "No Unit";

/// Decoded unit cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// The `No Unit` sentinel.
    NoUnit,
    Label(String),
    /// Blank cell.
    Missing,
}

impl Unit {
    pub fn from_cell(text: &str) -> Self {
        let text = text.trim();
        if Scalar::from_cell(text).is_empty() {
            Unit::Missing
        } else if text == NO_UNIT {
            Unit::NoUnit
        } else {
            Unit::Label(text.to_string())
        }
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, Unit::Missing)
    }
}

/// One schema row, with its ontology link parsed once up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub link: String,
    pub segments: Vec<Segment>,
    pub value: Scalar,
    pub unit: Unit,
    pub label: String,
}

impl Row {
    pub fn new(link: &str, value: Scalar, unit: Unit, label: &str) -> Result<Self, ConvertError> {
        let segments = parse_path(link).map_err(|err| match err {
            PathError::UnknownCommand { command, segment } => ConvertError::InvalidPathCommand {
                command,
                segment,
                value: value.to_string(),
                path: link.to_string(),
            },
        })?;
        Ok(Self {
            link: link.to_string(),
            segments,
            value,
            unit,
            label: label.to_string(),
        })
    }

    pub(crate) fn conflict(&self, err: NodeConflict) -> ConvertError {
        ConvertError::ScalarConflict {
            key: err.0,
            value: self.value.to_string(),
            path: self.link.clone(),
        }
    }
}

/// Which terminal branch a row ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachment {
    /// Empty value; the document is untouched.
    Skipped,
    /// Quantity object with numerical part and unit.
    Quantity,
    /// `@id` and `@type` from the unique-id table.
    Identifier,
    /// `rdfs:comment` with the raw value.
    Comment,
    /// The path ran out before reaching a terminal branch.
    Traversed,
}

/// State for one document assembly.
///
/// Created fresh for every conversion and dropped with it, so sibling
/// bookkeeping never leaks between documents.
pub struct BuildContext<'a> {
    pub tables: &'a LookupTables,
    pub settings: &'a Settings,
    registry: NodeRegistry,
}

impl<'a> BuildContext<'a> {
    pub fn new(tables: &'a LookupTables, settings: &'a Settings) -> Self {
        Self {
            tables,
            settings,
            registry: NodeRegistry::new(),
        }
    }
}

/// Apply `row` to the tree rooted at `root`.
pub fn apply(
    ctx: &mut BuildContext<'_>,
    root: &mut Node,
    row: &Row,
) -> Result<Attachment, ConvertError> {
    if row.value.is_empty() {
        return Ok(Attachment::Skipped);
    }

    let segments = &row.segments;
    let tokens = row_tokens(&row.label, &row.value);
    let mut cursor = root;
    let mut position = String::new();

    for (idx, segment) in segments.iter().enumerate() {
        let key = match segment {
            Segment::AssertType(name) => {
                cursor.merge_type(name);
                continue;
            }
            Segment::Key(key) => key.as_str(),
            Segment::Reverse(key) => {
                cursor = cursor.reverse_mut().map_err(|e| row.conflict(e))?;
                position.push_str("/@reverse");
                key.as_str()
            }
        };
        let is_last = idx + 1 == segments.len();
        let is_second_to_last = idx + 2 == segments.len();

        if is_second_to_last && row.unit != Unit::NoUnit {
            let Unit::Label(unit) = &row.unit else {
                return Err(ConvertError::MissingUnit {
                    value: row.value.to_string(),
                    path: row.link.clone(),
                });
            };
            let entry = quantity(ctx, &segments[idx + 1], &row.value, unit);
            cursor
                .set_or_append(key, entry)
                .map_err(|e| row.conflict(e))?;
            return Ok(Attachment::Quantity);
        }

        if is_last && row.unit == Unit::NoUnit {
            let target = if ctx.settings.is_multi_valued(key) {
                enter_sibling(ctx, cursor, key, &position, &tokens, SELF_SLOT, row)?.0
            } else {
                match descend(ctx, cursor, key, row)? {
                    Some((child, _)) => child,
                    None => return Ok(Attachment::Traversed),
                }
            };
            return Ok(attach_value(ctx, target, &row.value));
        }

        if ctx.settings.is_multi_valued(key) {
            let slot = display_path(&segments[idx + 1..]);
            let (child, child_position) =
                enter_sibling(ctx, cursor, key, &position, &tokens, &slot, row)?;
            cursor = child;
            position = child_position;
        } else {
            match descend(ctx, cursor, key, row)? {
                Some((child, child_position)) => {
                    cursor = child;
                    position.push_str(&child_position);
                }
                None => return Ok(Attachment::Traversed),
            }
        }
    }

    log::debug!("Row '{}' ({}) ended without a terminal value", row.label, row.link);
    Ok(Attachment::Traversed)
}

/// Move into `key`, creating it when absent. A key holding a sequence
/// resolves to its last element.
fn descend<'n>(
    ctx: &BuildContext<'_>,
    node: &'n mut Node,
    key: &str,
    row: &Row,
) -> Result<Option<(&'n mut Node, String)>, ConvertError> {
    if !node.contains_key(key) {
        if !(row.value.is_truthy() || row.unit.is_specified()) {
            return Ok(None);
        }
        node.insert(key, ctx.tables.seed_node(key));
    }

    let position = match node.sibling_count(key) {
        0 | 1 => format!("/{key}"),
        count => format!("/{key}[{}]", count - 1),
    };
    match node.last_of(key) {
        Some(child) => Ok(Some((child, position))),
        None => Err(row.conflict(NodeConflict(key.to_string()))),
    }
}

/// Move into the sibling of multi-valued connector `key` that this row
/// belongs to, creating a fresh sibling when no existing one can take it.
fn enter_sibling<'n>(
    ctx: &mut BuildContext<'_>,
    node: &'n mut Node,
    key: &str,
    position: &str,
    tokens: &Tokens,
    slot: &str,
    row: &Row,
) -> Result<(&'n mut Node, String), ConvertError> {
    let group = format!("{position}/{key}");
    let count = node.sibling_count(key);
    if count == 0 && node.contains_key(key) {
        return Err(row.conflict(NodeConflict(key.to_string())));
    }
    ctx.registry.sync(&group, count);

    let index = match ctx.registry.select(&group, tokens, slot) {
        Some(index) => {
            ctx.registry.record_visit(&group, index, tokens, slot);
            index
        }
        None => {
            let index = node
                .push_sibling(key, ctx.tables.seed_node(key))
                .map_err(|e| row.conflict(e))?;
            let registered = ctx.registry.register(&group, tokens);
            ctx.registry
                .record_visit(&group, registered, &Tokens::new(), slot);
            log::debug!("Created sibling {index} under {group} for '{}'", row.label);
            index
        }
    };

    let sibling = node
        .sibling_mut(key, index)
        .ok_or_else(|| row.conflict(NodeConflict(key.to_string())))?;
    Ok((sibling, format!("{group}[{index}]")))
}

/// Walk the first `depth` segments of `row`, creating plain nodes for absent
/// keys. Multi-valued connectors pick their sibling the same way `apply`
/// does, with the rest of the path as the slot.
pub(crate) fn walk<'n>(
    ctx: &mut BuildContext<'_>,
    root: &'n mut Node,
    row: &Row,
    depth: usize,
) -> Result<&'n mut Node, ConvertError> {
    let tokens = row_tokens(&row.label, &row.value);
    let mut cursor = root;
    let mut position = String::new();

    for (idx, segment) in row.segments.iter().enumerate().take(depth) {
        let key = match segment {
            Segment::AssertType(name) => {
                cursor.merge_type(name);
                continue;
            }
            Segment::Key(key) => key.as_str(),
            Segment::Reverse(key) => {
                cursor = cursor.reverse_mut().map_err(|e| row.conflict(e))?;
                position.push_str("/@reverse");
                key.as_str()
            }
        };

        if ctx.settings.is_multi_valued(key) {
            let slot = display_path(&row.segments[idx + 1..]);
            let (child, child_position) =
                enter_sibling(ctx, cursor, key, &position, &tokens, &slot, row)?;
            cursor = child;
            position = child_position;
            continue;
        }

        if !cursor.contains_key(key) {
            cursor.insert(key, Node::new());
        }
        match cursor.sibling_count(key) {
            0 | 1 => position.push_str(&format!("/{key}")),
            count => position.push_str(&format!("/{key}[{}]", count - 1)),
        }
        cursor = cursor
            .last_of(key)
            .ok_or_else(|| row.conflict(NodeConflict(key.to_string())))?;
    }
    Ok(cursor)
}

fn quantity(ctx: &BuildContext<'_>, type_segment: &Segment, value: &Scalar, unit: &str) -> Node {
    let unit_key = match ctx.tables.unit_key(unit) {
        Some(key) => key.to_string(),
        None => {
            log::warn!(
                "Unit '{unit}' is not in the unit map, using '{}'",
                ctx.settings.unknown_unit
            );
            ctx.settings.unknown_unit.clone()
        }
    };

    Node::typed(type_segment.type_name())
        .with(
            NUMERICAL_PART_KEY,
            Node::typed(&ctx.settings.real_data_type).with(NUMBER_VALUE_KEY, value.clone()),
        )
        .with(MEASUREMENT_UNIT_KEY, unit_key)
}

fn attach_value(ctx: &BuildContext<'_>, target: &mut Node, value: &Scalar) -> Attachment {
    if let Some(term) = value.as_str().filter(|t| ctx.tables.has_unique_id(t)) {
        if let Some(id) = ctx.tables.unique_id(term) {
            target.insert(ID_KEY, id);
        }
        target.merge_type(term);
        return Attachment::Identifier;
    }
    target.insert(COMMENT_KEY, value.clone());
    Attachment::Comment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeValue, TYPE_KEY};
    use serde_json::json;

    fn tables() -> LookupTables {
        LookupTables {
            units: [
                ("g", "Gram".to_string()),
                ("vol%", "VolumePercent".to_string()),
                ("mol/L", "MolePerLitre".to_string()),
            ]
            .into_iter()
            .collect(),
            connectors: [
                ("hasElectrolyte", Some("Electrolyte".to_string())),
                ("hasPositiveElectrode", Some("PositiveElectrode".to_string())),
                ("hasSolvent", None),
                ("hasSolute", None),
            ]
            .into_iter()
            .collect(),
            unique_ids: [
                ("LithiumHexafluorophosphate", Some("https://w3id.org/emmo#LiPF6".to_string())),
                ("Celgard2325", None),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn row(link: &str, value: &str, unit: &str, label: &str) -> Row {
        Row::new(link, Scalar::from_cell(value), Unit::from_cell(unit), label).unwrap()
    }

    fn build(rows: &[Row]) -> (Node, Vec<Attachment>) {
        let tables = tables();
        let settings = Settings::default();
        let mut ctx = BuildContext::new(&tables, &settings);
        let mut root = Node::new();
        let outcomes = rows
            .iter()
            .map(|r| apply(&mut ctx, &mut root, r).unwrap())
            .collect();
        (root, outcomes)
    }

    fn to_json(node: &Node) -> serde_json::Value {
        serde_json::to_value(node).unwrap()
    }

    #[test]
    fn test_unit_from_cell() {
        assert_eq!(Unit::from_cell("No Unit"), Unit::NoUnit);
        assert_eq!(Unit::from_cell(" g "), Unit::Label("g".into()));
        assert_eq!(Unit::from_cell(""), Unit::Missing);
        assert_eq!(Unit::from_cell("nan"), Unit::Missing);
    }

    #[test]
    fn test_empty_value_leaves_tree_unchanged() {
        let (mut root, _) = build(&[row("hasElectrolyte-schema:name", "LP30", "No Unit", "name")]);
        let before = root.clone();

        let tables = tables();
        let settings = Settings::default();
        let mut ctx = BuildContext::new(&tables, &settings);
        for value in ["", "  ", "nan"] {
            let r = row("hasSeparator-hasThickness-Thickness", value, "µm", "thickness");
            assert_eq!(apply(&mut ctx, &mut root, &r).unwrap(), Attachment::Skipped);
        }
        assert_eq!(root, before);
    }

    #[test]
    fn test_repeated_type_assertion_is_merged_once() {
        let r = row("hasCase-type|CoinCase", "CR2032", "No Unit", "case");
        let (root, outcomes) = build(&[r.clone(), r]);
        assert_eq!(outcomes, vec![Attachment::Traversed, Attachment::Traversed]);
        assert_eq!(to_json(&root), json!({"hasCase": {"@type": "CoinCase"}}));
    }

    #[test]
    fn test_quantity_branch() {
        let (root, outcomes) = build(&[row(
            "hasPositiveElectrode-hasMass-emmo:Mass",
            "0.5",
            "g",
            "Mass of positive electrode",
        )]);
        assert_eq!(outcomes, vec![Attachment::Quantity]);
        assert_eq!(
            to_json(&root),
            json!({
                "hasPositiveElectrode": {
                    "@type": "PositiveElectrode",
                    "hasMass": {
                        "@type": "emmo:Mass",
                        "hasNumericalPart": {"@type": "emmo:RealData", "hasNumberValue": 0.5},
                        "hasMeasurementUnit": "Gram"
                    }
                }
            })
        );
    }

    #[test]
    fn test_quantity_keeps_authored_decimals() {
        let (root, _) = build(&[row("hasThickness-type|Thickness", "25.00", "g", "t")]);
        let json = serde_json::to_string(&root).unwrap();
        assert!(json.contains(r#""hasNumberValue":25.00"#), "{json}");
    }

    #[test]
    fn test_unknown_unit_placeholder() {
        let (root, _) = build(&[row("hasDiameter-Diameter", "20", "furlong", "d")]);
        assert_eq!(
            to_json(&root)["hasDiameter"]["hasMeasurementUnit"],
            json!("UnknownUnit")
        );
    }

    #[test]
    fn test_three_quantities_listify_in_order() {
        let rows: Vec<_> = ["1", "2", "3"]
            .iter()
            .map(|v| row("hasCell-hasVoltage-Voltage", v, "g", "voltage"))
            .collect();
        let (root, _) = build(&rows);
        let values: Vec<_> = to_json(&root)["hasCell"]["hasVoltage"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["hasNumericalPart"]["hasNumberValue"].clone())
            .collect();
        assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_identifier_branch_excludes_comment() {
        let (root, outcomes) = build(&[
            row("hasElectrolyte-hasSalt", "LithiumHexafluorophosphate", "No Unit", "salt"),
            row("hasSeparator", "Celgard2325", "No Unit", "separator"),
            row("hasElectrolyte-schema:name", "LP30", "No Unit", "name"),
        ]);
        assert_eq!(
            outcomes,
            vec![Attachment::Identifier, Attachment::Identifier, Attachment::Comment]
        );
        let json = to_json(&root);
        assert_eq!(
            json["hasElectrolyte"]["hasSalt"],
            json!({"@id": "https://w3id.org/emmo#LiPF6", "@type": "LithiumHexafluorophosphate"})
        );
        // Blank identifier: the type is still merged, no @id.
        assert_eq!(json["hasSeparator"], json!({"@type": "Celgard2325"}));
        assert_eq!(json["hasElectrolyte"]["schema:name"], json!({"rdfs:comment": "LP30"}));
    }

    #[test]
    fn test_identifier_merges_with_connector_type() {
        let (root, _) = build(&[row(
            "hasElectrolyte",
            "LithiumHexafluorophosphate",
            "No Unit",
            "electrolyte",
        )]);
        let electrolyte = root.get("hasElectrolyte").unwrap().as_node().unwrap();
        assert_eq!(
            electrolyte.types(),
            vec!["Electrolyte", "LithiumHexafluorophosphate"]
        );
        assert!(!electrolyte.contains_key(COMMENT_KEY));
    }

    #[test]
    fn test_numeric_comment() {
        let (root, outcomes) = build(&[row("hasCell-hasNumberOfLayers", "0", "No Unit", "layers")]);
        assert_eq!(outcomes, vec![Attachment::Comment]);
        assert_eq!(
            to_json(&root)["hasCell"]["hasNumberOfLayers"],
            json!({"rdfs:comment": 0})
        );
    }

    #[test]
    fn test_solvent_scenario() {
        let (root, _) = build(&[
            row("hasElectrolyte-hasSolvent", "EC", "No Unit", "Solvent A: name"),
            row(
                "hasElectrolyte-hasSolvent-hasProportion-VolumeFraction",
                "0.5",
                "vol%",
                "Solvent A: ratio",
            ),
            row("hasElectrolyte-hasSolvent", "DMC", "No Unit", "Solvent B: name"),
        ]);
        assert_eq!(
            to_json(&root),
            json!({
                "hasElectrolyte": {
                    "@type": "Electrolyte",
                    "hasSolvent": [
                        {
                            "rdfs:comment": "EC",
                            "hasProportion": {
                                "@type": "VolumeFraction",
                                "hasNumericalPart": {"@type": "emmo:RealData", "hasNumberValue": 0.5},
                                "hasMeasurementUnit": "VolumePercent"
                            }
                        },
                        {"rdfs:comment": "DMC"}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_distinct_solvents_grow_one_sibling_each() {
        let labels = ["first", "second", "third", "fourth"];
        let rows: Vec<_> = labels
            .iter()
            .map(|l| row("hasElectrolyte-hasSolvent", &format!("S{l}"), "No Unit", l))
            .collect();
        let (root, _) = build(&rows);
        let electrolyte = root.get("hasElectrolyte").unwrap().as_node().unwrap();
        let solvents = electrolyte.get("hasSolvent").unwrap().as_nodes().unwrap();
        assert_eq!(solvents.len(), 4);
        for (solvent, label) in solvents.iter().zip(labels) {
            assert_eq!(
                solvent.get(COMMENT_KEY),
                Some(&NodeValue::from(format!("S{label}")))
            );
        }
    }

    #[test]
    fn test_rows_sharing_tokens_land_on_same_sibling() {
        // Names first, then the properties in a different order.
        let (root, _) = build(&[
            row("hasElectrolyte-hasSolvent", "EC", "No Unit", "Solvent 1 name"),
            row("hasElectrolyte-hasSolvent", "DMC", "No Unit", "Solvent 2 name"),
            row(
                "hasElectrolyte-hasSolvent-hasProportion-VolumeFraction",
                "30",
                "vol%",
                "Solvent 2 ratio",
            ),
            row(
                "hasElectrolyte-hasSolvent-schema:manufacturer",
                "Sigma",
                "No Unit",
                "Solvent 2 supplier",
            ),
            row(
                "hasElectrolyte-hasSolvent-hasProportion-VolumeFraction",
                "70",
                "vol%",
                "Solvent 1 ratio",
            ),
        ]);
        let json = to_json(&root);
        let solvents = json["hasElectrolyte"]["hasSolvent"].as_array().unwrap();
        assert_eq!(solvents.len(), 2);
        assert_eq!(solvents[0]["rdfs:comment"], json!("EC"));
        assert_eq!(
            solvents[0]["hasProportion"]["hasNumericalPart"]["hasNumberValue"],
            json!(70)
        );
        assert_eq!(solvents[1]["rdfs:comment"], json!("DMC"));
        assert_eq!(
            solvents[1]["hasProportion"]["hasNumericalPart"]["hasNumberValue"],
            json!(30)
        );
        assert_eq!(
            solvents[1]["schema:manufacturer"],
            json!({"rdfs:comment": "Sigma"})
        );
    }

    #[test]
    fn test_generic_labels_fill_open_siblings_before_growing() {
        let ratio = "hasElectrolyte-hasSolvent-hasProportion-VolumeFraction";
        let (root, _) = build(&[
            row("hasElectrolyte-hasSolvent", "EC", "No Unit", "Solvent 1 name"),
            row("hasElectrolyte-hasSolvent", "DMC", "No Unit", "Solvent 2 name"),
            row(ratio, "30", "vol%", "Solvent ratio"),
            row(ratio, "70", "vol%", "Solvent ratio"),
        ]);
        let json = to_json(&root);
        let solvents = json["hasElectrolyte"]["hasSolvent"].as_array().unwrap();
        assert_eq!(solvents.len(), 2, "{json}");
        let values: Vec<_> = solvents
            .iter()
            .map(|s| {
                (
                    s["rdfs:comment"].clone(),
                    s["hasProportion"]["hasNumericalPart"]["hasNumberValue"].clone(),
                )
            })
            .collect();
        assert_eq!(
            values,
            vec![(json!("EC"), json!(30)), (json!("DMC"), json!(70))]
        );
    }

    #[test]
    fn test_unlabelled_rows_follow_sibling_order() {
        let (root, _) = build(&[
            row("hasElectrolyte-hasSolute", "LiPF6", "No Unit", ""),
            row("hasElectrolyte-hasSolute", "LiTFSI", "No Unit", ""),
            row("hasElectrolyte-hasSolute-hasConcentration-Molarity", "1", "mol/L", ""),
            row("hasElectrolyte-hasSolute-hasConcentration-Molarity", "0.1", "mol/L", ""),
        ]);
        let json = to_json(&root);
        let solutes = json["hasElectrolyte"]["hasSolute"].as_array().unwrap();
        assert_eq!(solutes.len(), 2);
        assert_eq!(
            solutes[0]["hasConcentration"]["hasNumericalPart"]["hasNumberValue"],
            json!(1)
        );
        assert_eq!(
            solutes[1]["hasConcentration"]["hasNumericalPart"]["hasNumberValue"],
            json!(0.1)
        );
    }

    #[test]
    fn test_property_before_name_creates_then_fills_sibling() {
        let (root, _) = build(&[
            row(
                "hasElectrolyte-hasSolvent-hasProportion-VolumeFraction",
                "50",
                "vol%",
                "Solvent A ratio",
            ),
            row("hasElectrolyte-hasSolvent", "EC", "No Unit", "Solvent A name"),
        ]);
        let json = to_json(&root);
        let solvent = &json["hasElectrolyte"]["hasSolvent"];
        assert!(solvent.is_object(), "{solvent}");
        assert_eq!(solvent["rdfs:comment"], json!("EC"));
        assert!(solvent["hasProportion"].is_object());
    }

    #[test]
    fn test_reverse_segment() {
        let (root, _) = build(&[row(
            "hasCase-rev|isPartOf-schema:name",
            "Housing",
            "No Unit",
            "case",
        )]);
        assert_eq!(
            to_json(&root),
            json!({"hasCase": {"@reverse": {"isPartOf": {"schema:name": {"rdfs:comment": "Housing"}}}}})
        );
    }

    #[test]
    fn test_missing_unit_is_fatal() {
        let tables = tables();
        let settings = Settings::default();
        let mut ctx = BuildContext::new(&tables, &settings);
        let mut root = Node::new();
        let r = row("hasSeparator-hasThickness-Thickness", "25", "", "thickness");
        match apply(&mut ctx, &mut root, &r) {
            Err(ConvertError::MissingUnit { value, path }) => {
                assert_eq!(value, "25");
                assert_eq!(path, "hasSeparator-hasThickness-Thickness");
            }
            other => panic!("expected MissingUnit, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_path_command() {
        let err = Row::new(
            "hasCase-fwd|hasPart",
            Scalar::from("x"),
            Unit::NoUnit,
            "case",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidPathCommand { ref command, ref value, ref path, .. }
                if command == "fwd" && value == "x" && path == "hasCase-fwd|hasPart"
        ));
    }

    #[test]
    fn test_descending_into_scalar_is_reported() {
        let tables = tables();
        let settings = Settings::default();
        let mut ctx = BuildContext::new(&tables, &settings);
        let mut root = Node::new().with("schema:productID", "C-001");
        let r = row("schema:productID-schema:name", "x", "No Unit", "id");
        assert!(matches!(
            apply(&mut ctx, &mut root, &r),
            Err(ConvertError::ScalarConflict { ref key, .. }) if key == "schema:productID"
        ));
    }

    #[test]
    fn test_connector_seed_type() {
        let (root, _) = build(&[row("hasElectrolyte-schema:name", "LP30", "No Unit", "n")]);
        let electrolyte = root.get("hasElectrolyte").unwrap().as_node().unwrap();
        assert_eq!(electrolyte.get(TYPE_KEY), Some(&NodeValue::from("Electrolyte")));
    }

    #[test]
    fn test_sessions_do_not_share_registry_state() {
        let rows = [
            row("hasElectrolyte-hasSolvent", "EC", "No Unit", ""),
            row("hasElectrolyte-hasSolvent-hasProportion-VolumeFraction", "1", "vol%", ""),
        ];
        let (first, _) = build(&rows);
        let (second, _) = build(&rows);
        assert_eq!(first, second);
    }
}
