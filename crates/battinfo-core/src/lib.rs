//! Structural mapping engine for BattINFO metadata workbooks.
//!
//! A workbook is a flat list of schema rows, each naming an ontology link
//! (`hasElectrolyte-hasSolvent-hasProportion-VolumeFraction`), a value and a
//! unit. [`assemble::build`] walks those rows in order and grows a nested
//! JSON-LD [`node::Document`] that follows the BattINFO/EMMO ontology:
//!
//! * [`path`] decodes link segments (plain keys, `type|` assertions and
//!   `rev|` reverse properties);
//! * [`builder`] applies one row to the document;
//! * [`registry`] decides which sibling of a multi-valued connector
//!   (`hasSolvent`, `hasSolute`, ...) a row belongs to;
//! * [`workbook`] reads the five workbook sheets from CSV.

pub mod assemble;
pub mod builder;
pub mod config;
pub mod node;
pub mod path;
pub mod registry;
pub mod tables;
pub mod workbook;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use assemble::{build, Conversion, ConversionReport, RowOutcome, RowReport};
pub use builder::{Attachment, Row, Unit};
pub use config::Settings;
pub use node::{Document, Node, NodeValue, Scalar};
pub use workbook::Workbook;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Missing information in the schema, please fill in the field '{field}'")]
    MissingRequiredField { field: String },

    #[error("Missing unique ID for the field '{field}' (value '{value}')")]
    MissingUniqueId { field: String, value: String },

    #[error("The value '{value}' is filled in the wrong row, please check the schema (no unit for '{path}')")]
    MissingUnit { value: String, path: String },

    #[error("Unknown command '{command}' in segment '{segment}' of '{path}' (value '{value}')")]
    InvalidPathCommand {
        command: String,
        segment: String,
        value: String,
        path: String,
    },

    #[error("Cannot place '{value}' under '{key}' in '{path}': the key already holds a scalar")]
    ScalarConflict {
        key: String,
        value: String,
        path: String,
    },

    #[error("Missing workbook sheet '{sheet}'")]
    MissingSheet { sheet: String },

    #[error("Failed to read sheet '{sheet}'")]
    Sheet {
        sheet: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Settings(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Read the workbook in `dir` and convert it.
pub fn convert_dir(dir: &Path, settings: &Settings) -> Result<Conversion> {
    let workbook = Workbook::from_dir(dir)?;
    build(&workbook, settings)
}
