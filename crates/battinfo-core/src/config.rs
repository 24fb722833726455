use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConvertError;

pub const DEFAULT_CONTEXT_BASE: &str = "https://w3id.org/emmo/domain/battery/context";

/// Connectors whose children are modelled as an ordered list of siblings.
pub const DEFAULT_MULTI_VALUED_CONNECTORS: &[&str] =
    &["hasConstituent", "hasAdditive", "hasSolute", "hasSolvent"];

/// Converter settings.
///
/// Every field has a default, so an empty settings file is valid. Unknown
/// fields are rejected to surface typos early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Settings {
    /// First entry of the output `@context` array.
    pub context_base: String,

    /// Converter version named in the software credit comment.
    pub app_version: String,

    pub multi_valued_connectors: Vec<String>,

    /// `@type` of the numerical part of a quantity.
    pub real_data_type: String,

    /// Placeholder unit for labels missing from the unit map.
    pub unknown_unit: String,

    /// Schema `Metadata` label that carries the workbook schema version.
    pub schema_version_field: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            context_base: DEFAULT_CONTEXT_BASE.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            multi_valued_connectors: DEFAULT_MULTI_VALUED_CONNECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            real_data_type: "emmo:RealData".to_string(),
            unknown_unit: "UnknownUnit".to_string(),
            schema_version_field: "BattINFO CoinCellSchema version".to_string(),
        }
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self, ConvertError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConvertError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn is_multi_valued(&self, key: &str) -> bool {
        self.multi_valued_connectors.iter().any(|c| c == key)
    }

    /// Provenance note written as the document's final `rdfs:comment`.
    pub fn software_credit(&self, schema_version: Option<&str>) -> String {
        format!(
            "Software credit: This JSON-LD was created using BattINFO converter \
             (https://battinfoconverter.streamlit.app/) version: {} and the coin cell \
             battery schema version: {}, this web application was developed at Empa, \
             Swiss Federal Laboratories for Materials Science and Technology in the \
             Laboratory Materials for Energy Conversion",
            self.app_version,
            schema_version.unwrap_or("unknown"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::parse(
            r#"
            app-version = "9.9.9"
            multi-valued-connectors = ["hasSolvent", "hasBinder"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.app_version, "9.9.9");
        assert!(settings.is_multi_valued("hasBinder"));
        assert!(!settings.is_multi_valued("hasConstituent"));
        assert_eq!(settings.context_base, DEFAULT_CONTEXT_BASE);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            Settings::parse("context_base = \"x\""),
            Err(ConvertError::Settings(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("battinfo.toml");
        std::fs::write(&path, "unknown-unit = \"emmo:UnknownUnit\"\n").unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.unknown_unit, "emmo:UnknownUnit");

        assert!(matches!(
            Settings::from_file(&dir.path().join("missing.toml")),
            Err(ConvertError::Io { .. })
        ));
    }

    #[test]
    fn test_software_credit_names_both_versions() {
        let settings = Settings {
            app_version: "1.2.3".into(),
            ..Default::default()
        };
        let credit = settings.software_credit(Some("1.1.8"));
        assert!(credit.starts_with("Software credit:"));
        assert!(credit.contains("version: 1.2.3 and"));
        assert!(credit.contains("schema version: 1.1.8,"));
    }
}
