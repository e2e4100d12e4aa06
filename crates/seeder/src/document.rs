//! Format dispatch and decoding of configuration documents

use std::path::Path;

use config_seed_config::SeedSettings;
use config_seed_types::{FlatEntry, Value};

use crate::properties::{parse_line_toml, parse_properties};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("properties parse error on line {line}: {message}")]
    Properties { line: usize, message: String },

    #[error("key {key} holds a {kind}; flat documents may only hold scalars")]
    NotFlat { key: String, kind: &'static str },

    #[error("document root is a {0}; expected a mapping")]
    NotMapping(&'static str),
}

/// Decoder selected for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `key=value` lines
    Properties,
    /// Single-level YAML mapping
    FlatYaml,
    /// `key = value` TOML lines, sections ignored
    LineToml,
}

impl DocumentFormat {
    /// Decoder for a file found by the legacy pipeline. Anything that is not
    /// a configured YAML or TOML extension is read as properties.
    pub fn for_legacy(path: &Path, settings: &SeedSettings) -> Self {
        let ext = extension(path);
        if settings.toml_extensions.iter().any(|e| e == ext) {
            DocumentFormat::LineToml
        } else if settings.yaml_extensions.iter().any(|e| e == ext) {
            DocumentFormat::FlatYaml
        } else {
            DocumentFormat::Properties
        }
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Read and decode a legacy file straight to flat entries.
pub fn load_flat(path: &Path, settings: &SeedSettings) -> Result<Vec<FlatEntry>, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    decode_flat(DocumentFormat::for_legacy(path, settings), &content)
}

/// Read and decode a hierarchical TOML file.
pub fn load_structured(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    decode_structured(&content)
}

/// Decode a flat document. Entry paths are the document keys, unchanged.
pub fn decode_flat(format: DocumentFormat, content: &str) -> Result<Vec<FlatEntry>, DocumentError> {
    let pairs = match format {
        DocumentFormat::Properties => parse_properties(content)?,
        DocumentFormat::LineToml => parse_line_toml(content),
        DocumentFormat::FlatYaml => return decode_flat_yaml(content),
    };

    Ok(pairs
        .into_iter()
        .map(|(key, value)| FlatEntry::new(key, value))
        .collect())
}

/// Decode a full TOML document.
pub fn decode_structured(content: &str) -> Result<Value, DocumentError> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(Value::from(toml::Value::Table(table)))
}

fn decode_flat_yaml(content: &str) -> Result<Vec<FlatEntry>, DocumentError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content)?;
    flat_mapping(Value::from(doc))
}

/// Scalars are re-serialized from their decoded value, not copied from the
/// source text: `1.10` is written as `1.1` and `0x10` as `16`.
fn flat_mapping(value: Value) -> Result<Vec<FlatEntry>, DocumentError> {
    let map = match value {
        Value::Mapping(map) => map,
        // An empty document decodes to null.
        Value::Null => return Ok(Vec::new()),
        other => return Err(DocumentError::NotMapping(other.kind())),
    };

    map.into_iter()
        .map(|(key, value)| match value.as_scalar() {
            Some(scalar) => Ok(FlatEntry::new(key, scalar.serialize())),
            None => Err(DocumentError::NotFlat {
                key,
                kind: value.kind(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pairs(entries: Vec<FlatEntry>) -> Vec<(String, String)> {
        entries.into_iter().map(|e| (e.path, e.value)).collect()
    }

    #[test]
    fn test_format_dispatch() {
        let settings = SeedSettings::default();
        let format = |name: &str| DocumentFormat::for_legacy(&PathBuf::from(name), &settings);

        assert_eq!(format("application.properties"), DocumentFormat::Properties);
        assert_eq!(format("application.yaml"), DocumentFormat::FlatYaml);
        assert_eq!(format("application.yml"), DocumentFormat::FlatYaml);
        assert_eq!(format("application.toml"), DocumentFormat::LineToml);
        assert_eq!(format("noext"), DocumentFormat::Properties);
    }

    #[test]
    fn test_flat_yaml_serializes_scalars() {
        let entries = decode_flat(
            DocumentFormat::FlatYaml,
            "host: localhost\nport: 48080\nratio: 2.0\nenabled: true\nnote:\n",
        )
        .unwrap();

        assert_eq!(
            pairs(entries),
            vec![
                ("enabled".to_string(), "true".to_string()),
                ("host".to_string(), "localhost".to_string()),
                ("note".to_string(), String::new()),
                ("port".to_string(), "48080".to_string()),
                ("ratio".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_flat_yaml_writes_decoded_not_source_text() {
        let entries = decode_flat(
            DocumentFormat::FlatYaml,
            "version: 1.10\nmask: 0x10\nquoted: \"1.10\"\n",
        )
        .unwrap();

        assert_eq!(
            pairs(entries),
            vec![
                ("mask".to_string(), "16".to_string()),
                ("quoted".to_string(), "1.10".to_string()),
                ("version".to_string(), "1.1".to_string()),
            ]
        );
    }

    #[test]
    fn test_flat_yaml_rejects_nesting() {
        let err = decode_flat(DocumentFormat::FlatYaml, "service:\n  port: 1\n").unwrap_err();
        assert!(matches!(err, DocumentError::NotFlat { ref key, kind: "mapping" } if key == "service"));

        let err = decode_flat(DocumentFormat::FlatYaml, "- a\n- b\n").unwrap_err();
        assert!(matches!(err, DocumentError::NotMapping("sequence")));
    }

    #[test]
    fn test_empty_yaml_document() {
        assert!(decode_flat(DocumentFormat::FlatYaml, "").unwrap().is_empty());
    }

    #[test]
    fn test_decode_structured_error() {
        assert!(matches!(
            decode_structured("[Service\nPort = 1"),
            Err(DocumentError::Toml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_structured(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
    }
}
