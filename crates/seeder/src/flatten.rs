//! Hierarchical document to flat keyspace

use config_seed_types::{FlatEntry, Value, KEY_SEPARATOR};

/// Flattens `value` into one entry per scalar or null leaf.
///
/// Mapping keys and sequence indices become `/`-separated path segments under
/// `prefix`. Empty sequences and mappings produce no entries; their path is
/// never materialized. Entry order follows sequence order and sorted mapping
/// keys.
pub fn flatten(prefix: &str, value: &Value) -> Vec<FlatEntry> {
    let mut entries = Vec::with_capacity(value.leaf_count());
    flatten_into(prefix, value, &mut entries);
    entries
}

fn flatten_into(path: &str, value: &Value, out: &mut Vec<FlatEntry>) {
    match value {
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(&child_path(path, &index.to_string()), item, out);
            }
        }
        Value::Mapping(map) => {
            for (key, item) in map {
                flatten_into(&child_path(path, key), item, out);
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::String(_) | Value::Null => {
            let text = value
                .as_scalar()
                .map(|scalar| scalar.serialize())
                .unwrap_or_default();
            out.push(FlatEntry::new(path, text));
        }
    }
}

fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}{KEY_SEPARATOR}{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn mapping(pairs: Vec<(&str, Value)>) -> Value {
        Value::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn pairs(entries: &[FlatEntry]) -> Vec<(&str, &str)> {
        entries
            .iter()
            .map(|e| (e.path.as_str(), e.value.as_str()))
            .collect()
    }

    #[test]
    fn test_nested_mapping_path() {
        let value = mapping(vec![("b", mapping(vec![("c", Value::Integer(1))]))]);
        let entries = flatten("a", &value);
        assert_eq!(pairs(&entries), vec![("a/b/c", "1")]);
    }

    #[test]
    fn test_sequence_at_root() {
        let value = Value::Sequence(vec![Value::Integer(10), Value::Integer(20)]);
        let entries = flatten("", &value);
        assert_eq!(pairs(&entries), vec![("0", "10"), ("1", "20")]);
    }

    #[test]
    fn test_mixed_document() {
        let value = mapping(vec![
            ("Service", mapping(vec![
                ("Host", Value::String("localhost".into())),
                ("Port", Value::Integer(48080)),
                ("Timeout", Value::Float(5000.0)),
            ])),
            ("Clients", Value::Sequence(vec![
                mapping(vec![("Name", Value::String("metadata".into()))]),
                mapping(vec![("Enabled", Value::Boolean(false))]),
            ])),
            ("Comment", Value::Null),
        ]);

        let entries = flatten("", &value);
        assert_eq!(
            pairs(&entries),
            vec![
                ("Clients/0/Name", "metadata"),
                ("Clients/1/Enabled", "false"),
                ("Comment", ""),
                ("Service/Host", "localhost"),
                ("Service/Port", "48080"),
                ("Service/Timeout", "5000"),
            ]
        );
    }

    #[test]
    fn test_leaf_count_matches_entries() {
        let value = mapping(vec![
            ("a", Value::Sequence(vec![Value::Null, Value::Boolean(true)])),
            ("b", mapping(vec![])),
            ("c", Value::Sequence(vec![])),
            ("d", mapping(vec![("e", Value::Sequence(vec![Value::Sequence(vec![])]))])),
            ("f", Value::String(String::new())),
        ]);

        let entries = flatten("root", &value);
        assert_eq!(entries.len(), value.leaf_count());
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_empty_structures_are_invisible() {
        assert!(flatten("x", &mapping(vec![])).is_empty());
        assert!(flatten("x", &Value::Sequence(vec![])).is_empty());
    }

    #[test]
    fn test_scalar_root_uses_prefix_as_path() {
        assert_eq!(pairs(&flatten("only", &Value::Boolean(true))), vec![("only", "true")]);
        assert_eq!(pairs(&flatten("", &Value::Null)), vec![("", "")]);
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let doc: toml::Table = toml::from_str(
            r#"
            [Writable]
            LogLevel = "INFO"
            [Databases.Primary]
            Host = "localhost"
            Port = 6379
            "#,
        )
        .unwrap();
        let value = Value::from(toml::Value::Table(doc));

        let first = flatten("", &value);
        for _ in 0..10 {
            assert_eq!(flatten("", &value), first);
        }
    }
}
