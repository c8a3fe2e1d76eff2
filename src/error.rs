//! Typed errors for extraction, merge, and artifact I/O.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid service name '{0}': expected letters, digits or '_'")]
    InvalidServiceName(String),
    #[error("unknown crud method '{0}' (expected insert, update, query or delete)")]
    UnknownCrudMethod(String),
    #[error("config load: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum GenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no compatible type found for `{data_type}`. column: `{table}`.`{column}`")]
    UnmappableType {
        data_type: String,
        table: String,
        column: String,
    },
    #[error("cannot read enum values from `{detail}`. column: `{table}`.`{column}`")]
    MalformedEnum {
        table: String,
        column: String,
        detail: String,
    },
    #[error("tag `{tag}` is already in use by field `{field}`")]
    EnumTagCollision { tag: i32, field: String },
    #[error("no columns to generate")]
    NoColumns,
    #[error("template: {0}")]
    Template(String),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl GenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }
}
