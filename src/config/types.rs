//! Generator settings as read from a JSON file or the environment.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

fn default_tables() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Directory the two artifacts are written to.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    pub service_name: String,
    /// Table names, or `*` for all.
    #[serde(default = "default_tables", deserialize_with = "string_or_list")]
    pub tables: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub ignore_tables: Vec<String>,
    /// Raw method names; parsed by the validator.
    #[serde(default, deserialize_with = "string_or_list")]
    pub crud_methods: Vec<String>,
    #[serde(default)]
    pub proto_file: Option<PathBuf>,
    #[serde(default)]
    pub logic_dir: Option<PathBuf>,
    #[serde(default)]
    pub database_url: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            dir: default_dir(),
            service_name: String::new(),
            tables: default_tables(),
            ignore_tables: Vec::new(),
            crud_methods: Vec::new(),
            proto_file: None,
            logic_dir: None,
            database_url: None,
        }
    }
}

/// Splits a comma-separated setting, dropping blanks.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Accepts `"a,b"` as well as `["a", "b"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::String(s) => Ok(split_list(&s)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s.trim().to_string()),
                other => Err(serde::de::Error::custom(format!(
                    "list entries must be strings; got {}",
                    other
                ))),
            })
            .collect(),
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a comma-separated string or a list of strings; got {}",
            other
        ))),
    }
}
