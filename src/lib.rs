//! apigen: `.api` contract generation from a relational catalog, with an additive merge into
//! previously generated files, plus logic skeletons for definition-file RPCs.

pub mod case;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod logic;
pub mod merge;
pub mod render;
pub mod schema;
pub mod store;

pub use config::{from_env, from_json_file, validate, GeneratorConfig};
pub use dispatch::{classify, resolve_primary_key, CrudKind, PrimaryKey};
pub use error::{ConfigError, GenError};
pub use generator::{generate_api, load_definition, ArtifactReport, ArtifactStatus, GenerationReport};
pub use logic::{generate_logic, LogicReport, LogicTarget, PlaceholderEngine, TemplateEngine};
pub use merge::{merge_params, merge_service, MergeOutcome};
pub use render::{render_params, render_service};
pub use schema::{Column, CrudMethod, Schema};
pub use store::{key_source, MySqlStore, Offline, PrimaryKeyColumn, SchemaSource, TableSelection};
