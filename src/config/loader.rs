//! Load generator settings from a JSON file or from `APIGEN_*` environment variables.

use crate::config::types::{split_list, GeneratorConfig};
use crate::config::validate;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

pub const ENV_DIR: &str = "APIGEN_DIR";
pub const ENV_SERVICE: &str = "APIGEN_SERVICE";
pub const ENV_TABLES: &str = "APIGEN_TABLES";
pub const ENV_IGNORE_TABLES: &str = "APIGEN_IGNORE_TABLES";
pub const ENV_CRUD_METHODS: &str = "APIGEN_CRUD_METHODS";
pub const ENV_PROTO_FILE: &str = "APIGEN_PROTO_FILE";
pub const ENV_LOGIC_DIR: &str = "APIGEN_LOGIC_DIR";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

pub fn from_json_str(text: &str) -> Result<GeneratorConfig, ConfigError> {
    let config: GeneratorConfig = serde_json::from_str(text).map_err(|e| ConfigError::Load(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

pub fn from_json_file(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    from_json_str(&text)
}

/// Builds a config from a variable lookup. Unset variables keep their defaults.
pub fn from_vars<F>(lookup: F) -> Result<GeneratorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut config = GeneratorConfig {
        service_name: get(ENV_SERVICE).ok_or(ConfigError::Missing(ENV_SERVICE))?,
        ..Default::default()
    };
    if let Some(dir) = get(ENV_DIR) {
        config.dir = PathBuf::from(dir);
    }
    if let Some(tables) = get(ENV_TABLES) {
        config.tables = split_list(&tables);
    }
    if let Some(ignore) = get(ENV_IGNORE_TABLES) {
        config.ignore_tables = split_list(&ignore);
    }
    if let Some(methods) = get(ENV_CRUD_METHODS) {
        config.crud_methods = split_list(&methods);
    }
    config.proto_file = get(ENV_PROTO_FILE).map(PathBuf::from);
    config.logic_dir = get(ENV_LOGIC_DIR).map(PathBuf::from);
    config.database_url = get(ENV_DATABASE_URL);
    validate(&config)?;
    Ok(config)
}

/// Reads `.env` when present, then the process environment.
pub fn from_env() -> Result<GeneratorConfig, ConfigError> {
    dotenvy::dotenv().ok();
    from_vars(|key| std::env::var(key).ok())
}
