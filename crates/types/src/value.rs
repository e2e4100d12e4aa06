use std::collections::BTreeMap;
use std::fmt;

/// Decoded configuration document.
///
/// Mappings are ordered by key so that a flattening pass over the same
/// document always yields entries in the same order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

/// Borrowed view of a leaf value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(&'a str),
    Null,
}

impl Value {
    /// Returns the leaf view of this value, or `None` for sequences and mappings.
    pub fn as_scalar(&self) -> Option<Scalar<'_>> {
        match self {
            Value::Sequence(_) | Value::Mapping(_) => None,
            Value::Integer(i) => Some(Scalar::Integer(*i)),
            Value::Float(f) => Some(Scalar::Float(*f)),
            Value::Boolean(b) => Some(Scalar::Boolean(*b)),
            Value::String(s) => Some(Scalar::String(s)),
            Value::Null => Some(Scalar::Null),
        }
    }

    /// Number of scalar and null leaves below (and including) this value.
    pub fn leaf_count(&self) -> usize {
        match self {
            Value::Sequence(items) => items.iter().map(Value::leaf_count).sum(),
            Value::Mapping(map) => map.values().map(Value::leaf_count).sum(),
            _ => 1,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Null => "null",
        }
    }
}

impl Scalar<'_> {
    /// Canonical registry text for this scalar.
    ///
    /// Floats use the shortest representation that round-trips, never in
    /// exponent form, so `3.0` becomes `"3"` and `1e21` becomes
    /// `"1000000000000000000000"`. Infinities are written `+Inf` / `-Inf`.
    pub fn serialize(&self) -> String {
        match self {
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => format_float(*f),
            Scalar::Boolean(b) => b.to_string(),
            Scalar::String(s) => (*s).to_string(),
            Scalar::Null => String::new(),
        }
    }
}

impl fmt::Display for Scalar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "+Inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        // `Display` for f64 is shortest round-trip and never uses an exponent.
        format!("{f}")
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Boolean(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => Value::Mapping(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Boolean(b),
            serde_yaml::Value::Number(n) => yaml_number(&n),
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Integer(i)
    } else if let Some(u) = n.as_u64() {
        // Above i64::MAX: keep the exact digits rather than lose precision.
        Value::String(u.to_string())
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match Value::from(key) {
        Value::String(s) => s,
        other => match other.as_scalar() {
            Some(scalar) => scalar.serialize(),
            None => format!("{other:?}"),
        },
    }
}
