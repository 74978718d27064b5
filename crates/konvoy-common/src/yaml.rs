//! YAML normalisation using yaml-rust2
//!
//! Converts YAML text into `serde_json::Value` so that every textual input
//! (YAML or JSON, which is a YAML subset) goes through a single typed
//! deserialization path.

use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

/// Error type for YAML parsing
#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    /// The text is not well-formed, or uses unsupported YAML features
    #[error("{0}")]
    Syntax(String),
    /// A single value was expected but the text holds several documents
    #[error("expected a single document, found {0}")]
    MultipleDocuments(usize),
    /// The text is neither YAML nor JSON; carries the JSON parser's error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Parse a single-document YAML string into a serde_json::Value.
///
/// Returns `Value::Null` for empty input and rejects multi-document text.
pub fn parse_yaml(input: &str) -> Result<Value, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError::Syntax(e.to_string()))?;
    if docs.len() > 1 {
        return Err(YamlError::MultipleDocuments(docs.len()));
    }
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Normalise a textual payload that may be YAML or JSON.
///
/// YAML is tried first. If the text is not valid YAML it is parsed as JSON
/// instead, so the error reported is the JSON parser's structural error
/// rather than a confusing YAML one.
pub fn yaml_or_json(input: &str) -> Result<Value, YamlError> {
    match parse_yaml(input) {
        Err(YamlError::Syntax(_)) => Ok(serde_json::from_str(input)?),
        other => other,
    }
}

/// Convert a yaml_rust2::Yaml value to serde_json::Value
fn yaml_to_json(yaml: Yaml) -> Result<Value, YamlError> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => {
            let f: f64 = s
                .parse()
                .map_err(|e: std::num::ParseFloatError| YamlError::Syntax(e.to_string()))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Real(r) => r,
                    Yaml::Boolean(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    _ => return Err(YamlError::Syntax("unsupported YAML key type".to_string())),
                };
                yaml_to_json(v).map(|v| (key, v))
            })
            .collect::<Result<Map<String, Value>, _>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(YamlError::Syntax("YAML aliases not supported".to_string())),
        Yaml::BadValue => Err(YamlError::Syntax("bad YAML value".to_string())),
    }
}
