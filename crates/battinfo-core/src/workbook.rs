//! CSV export of the BattINFO metadata workbook.
//!
//! Each workbook sheet is one CSV file in a directory. Every cell is read as
//! text, so numbers never pass through a float and keep their authored digits.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::builder::Unit;
use crate::node::Scalar;
use crate::tables::LookupTables;
use crate::ConvertError;

pub const SCHEMA_SHEET: &str = "schema.csv";
pub const UNIT_MAP_SHEET: &str = "unit_map.csv";
pub const CONTEXT_TOPLEVEL_SHEET: &str = "context_toplevel.csv";
pub const CONTEXT_CONNECTOR_SHEET: &str = "context_connector.csv";
pub const UNIQUE_ID_SHEET: &str = "unique_id.csv";

/// One row of the `Schema` sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRow {
    pub metadata: String,
    pub value: Scalar,
    pub unit: Unit,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct RawSchemaRow {
    #[serde(rename = "Metadata", default)]
    metadata: String,
    #[serde(rename = "Value", default)]
    value: String,
    #[serde(rename = "Unit", default)]
    unit: String,
    #[serde(rename = "Ontology link", default)]
    link: String,
}

impl From<RawSchemaRow> for SchemaRow {
    fn from(raw: RawSchemaRow) -> Self {
        Self {
            metadata: raw.metadata.trim_end().to_string(),
            value: Scalar::from_cell(&raw.value),
            unit: Unit::from_cell(&raw.unit),
            link: raw.link.trim().to_string(),
        }
    }
}

/// `Item` → `Key` (or `ID`) row of a lookup sheet.
#[derive(Debug, Deserialize)]
struct RawPair {
    #[serde(rename = "Item", default)]
    item: String,
    #[serde(rename = "Key", alias = "ID", default)]
    key: String,
}

impl RawPair {
    /// Trimmed item and key; `None` for rows without an item.
    fn into_entry(self) -> Option<(String, Option<String>)> {
        let item = self.item.trim();
        if Scalar::from_cell(item).is_empty() {
            return None;
        }
        let key = self.key.trim();
        let key = (!Scalar::from_cell(key).is_empty()).then(|| key.to_string());
        Some((item.to_string(), key))
    }
}

/// Readers for the five workbook sheets.
pub struct Sheets<R> {
    pub schema: R,
    pub unit_map: R,
    pub context_toplevel: R,
    pub context_connector: R,
    pub unique_id: R,
}

/// Everything a conversion reads from the workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub rows: Vec<SchemaRow>,
    /// Term definitions of the output `@context`.
    pub context_terms: IndexMap<String, String>,
    pub tables: LookupTables,
}

impl Workbook {
    pub fn from_dir(dir: &Path) -> Result<Self, ConvertError> {
        let open = |sheet: &str| -> Result<File, ConvertError> {
            let path = dir.join(sheet);
            if !path.is_file() {
                return Err(ConvertError::MissingSheet {
                    sheet: sheet.to_string(),
                });
            }
            File::open(&path).map_err(|source| ConvertError::Io { path, source })
        };

        log::debug!("Reading workbook sheets from {}", dir.display());
        Self::from_readers(Sheets {
            schema: open(SCHEMA_SHEET)?,
            unit_map: open(UNIT_MAP_SHEET)?,
            context_toplevel: open(CONTEXT_TOPLEVEL_SHEET)?,
            context_connector: open(CONTEXT_CONNECTOR_SHEET)?,
            unique_id: open(UNIQUE_ID_SHEET)?,
        })
    }

    pub fn from_readers<R: Read>(sheets: Sheets<R>) -> Result<Self, ConvertError> {
        let rows = read_records::<RawSchemaRow, _>(SCHEMA_SHEET, sheets.schema)?
            .into_iter()
            .map(SchemaRow::from)
            .collect();

        let pairs = |sheet: &str, reader: R| -> Result<Vec<(String, Option<String>)>, ConvertError> {
            Ok(read_records::<RawPair, _>(sheet, reader)?
                .into_iter()
                .filter_map(RawPair::into_entry)
                .collect())
        };

        let units = pairs(UNIT_MAP_SHEET, sheets.unit_map)?
            .into_iter()
            .filter_map(|(item, key)| match key {
                Some(key) => Some((item, key)),
                None => {
                    log::debug!("Unit '{item}' has no ontology key, skipping");
                    None
                }
            })
            .collect();

        let mut context_terms = IndexMap::new();
        for (item, key) in pairs(CONTEXT_TOPLEVEL_SHEET, sheets.context_toplevel)? {
            match key {
                Some(iri) => {
                    context_terms.entry(item).or_insert(iri);
                }
                None => log::debug!("Context term '{item}' has no IRI, skipping"),
            }
        }

        let connectors = pairs(CONTEXT_CONNECTOR_SHEET, sheets.context_connector)?
            .into_iter()
            .collect();
        let unique_ids = pairs(UNIQUE_ID_SHEET, sheets.unique_id)?
            .into_iter()
            .collect();

        Ok(Self {
            rows,
            context_terms,
            tables: LookupTables {
                units,
                connectors,
                unique_ids,
            },
        })
    }

    /// Value of the first schema row whose `Metadata` is `field`.
    pub fn value_of(&self, field: &str) -> Option<&Scalar> {
        let field = field.trim_end_matches(' ');
        self.rows
            .iter()
            .find(|row| row.metadata == field)
            .map(|row| &row.value)
    }
}

fn read_records<T: DeserializeOwned, R: Read>(
    sheet: &str,
    reader: R,
) -> Result<Vec<T>, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|source| ConvertError::Sheet {
            sheet: sheet.to_string(),
            source,
        })
}
