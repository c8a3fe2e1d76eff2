//! Config validation: service name shape and CRUD method names.

use crate::config::GeneratorConfig;
use crate::error::ConfigError;
use crate::schema::CrudMethod;

/// Letters, digits and `_`, not starting with a digit.
pub fn is_valid_service_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Parsed CRUD methods in configured order, duplicates dropped.
pub fn crud_methods(config: &GeneratorConfig) -> Result<Vec<CrudMethod>, ConfigError> {
    let mut out = Vec::new();
    for raw in config.crud_methods.iter().filter(|m| !m.trim().is_empty()) {
        let method: CrudMethod = raw.parse()?;
        if !out.contains(&method) {
            out.push(method);
        }
    }
    Ok(out)
}

pub fn validate(config: &GeneratorConfig) -> Result<(), ConfigError> {
    if config.service_name.trim().is_empty() {
        return Err(ConfigError::Missing("service_name"));
    }
    if !is_valid_service_name(&config.service_name) {
        return Err(ConfigError::InvalidServiceName(config.service_name.clone()));
    }
    crud_methods(config)?;
    Ok(())
}

/// Database URL, required by every command that introspects the catalog.
pub fn database_url(config: &GeneratorConfig) -> Result<&str, ConfigError> {
    config
        .database_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or(ConfigError::Missing("database_url"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(service: &str, methods: &[&str]) -> GeneratorConfig {
        GeneratorConfig {
            service_name: service.to_string(),
            crud_methods: methods.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn service_names() {
        assert!(validate(&config("shop_api", &[])).is_ok());
        assert!(matches!(validate(&config("", &[])), Err(ConfigError::Missing("service_name"))));
        assert!(matches!(
            validate(&config("9shop", &[])),
            Err(ConfigError::InvalidServiceName(_))
        ));
        assert!(matches!(
            validate(&config("shop-api", &[])),
            Err(ConfigError::InvalidServiceName(_))
        ));
    }

    #[test]
    fn crud_methods_parse_and_dedupe() {
        let methods = crud_methods(&config("shop", &["Create", "query", "insert", " "])).unwrap();
        assert_eq!(methods, vec![CrudMethod::Insert, CrudMethod::Query]);
        assert!(matches!(
            validate(&config("shop", &["upsert"])),
            Err(ConfigError::UnknownCrudMethod(ref m)) if m == "upsert"
        ));
    }

    #[test]
    fn database_url_is_required_when_asked_for() {
        assert!(matches!(database_url(&config("shop", &[])), Err(ConfigError::Missing("database_url"))));
    }
}
