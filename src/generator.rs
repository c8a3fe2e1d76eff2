//! One generation run: introspect, build the schema, then create or merge both artifacts.

use crate::config::{crud_methods, GeneratorConfig};
use crate::error::GenError;
use crate::merge::{merge_params, merge_service, MergeOutcome};
use crate::render::{param_file_name, param_path, render_params, render_service, service_path};
use crate::schema::{append_definition_messages, filter_columns, parse_definition, schema_from_columns, DefinitionFile, Schema};
use crate::store::{SchemaSource, TableSelection};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactStatus {
    Created,
    Merged { added: Vec<String> },
    Unchanged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactReport {
    pub path: PathBuf,
    pub status: ArtifactStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationReport {
    pub params: ArtifactReport,
    pub service: ArtifactReport,
}

/// Reads and parses a definition file.
pub async fn load_definition(path: &Path) -> Result<DefinitionFile, GenError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GenError::io(path, e))?;
    Ok(parse_definition(&text))
}

/// Builds the in-memory schema for `config`. No file is touched.
pub async fn build_schema<S: SchemaSource + ?Sized>(
    source: &S,
    config: &GeneratorConfig,
    definition: Option<&DefinitionFile>,
) -> Result<Schema, GenError> {
    let mut schema = Schema::new(config.service_name.clone(), config.dir.to_string_lossy().into_owned());
    schema.crud_methods = crud_methods(config)?;

    let selection = TableSelection::parse(&config.tables.join(","));
    let columns = filter_columns(source.columns(&selection).await?, &config.ignore_tables);
    schema_from_columns(&mut schema, &columns)?;

    if let Some(def) = definition {
        append_definition_messages(&mut schema, def);
    }
    schema.append_import(param_file_name(&schema.service_name));
    schema.finalize();
    Ok(schema)
}

/// Temp file next to `path`, then rename over it.
pub async fn write_atomic(path: &Path, content: &str) -> Result<(), GenError> {
    let tmp = path.with_extension("api.tmp");
    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| GenError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| GenError::io(path, e))
}

struct Planned {
    path: PathBuf,
    text: String,
    status: ArtifactStatus,
}

async fn plan(path: PathBuf, fresh: impl FnOnce() -> String, merge: impl FnOnce(&str) -> MergeOutcome) -> Result<Planned, GenError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(existing) => {
            let outcome = merge(&existing);
            let status = if outcome.changed() && outcome.text != existing {
                ArtifactStatus::Merged { added: outcome.added }
            } else {
                ArtifactStatus::Unchanged
            };
            Ok(Planned {
                path,
                text: outcome.text,
                status,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Planned {
            path,
            text: fresh(),
            status: ArtifactStatus::Created,
        }),
        Err(e) => Err(GenError::io(path, e)),
    }
}

async fn commit(planned: Planned) -> Result<ArtifactReport, GenError> {
    match &planned.status {
        ArtifactStatus::Unchanged => {
            tracing::info!(path = %planned.path.display(), "artifact up to date");
        }
        ArtifactStatus::Created => {
            write_atomic(&planned.path, &planned.text).await?;
            tracing::info!(path = %planned.path.display(), "artifact created");
        }
        ArtifactStatus::Merged { added } => {
            write_atomic(&planned.path, &planned.text).await?;
            tracing::info!(path = %planned.path.display(), added = ?added, "artifact merged");
        }
    }
    Ok(ArtifactReport {
        path: planned.path,
        status: planned.status,
    })
}

/// Writes the parameters and service artifacts for an already built schema.
/// Both texts are computed before either file is written.
pub async fn write_artifacts(schema: &Schema) -> Result<GenerationReport, GenError> {
    tokio::fs::create_dir_all(&schema.dir)
        .await
        .map_err(|e| GenError::io(&schema.dir, e))?;

    let params = plan(param_path(schema), || render_params(schema), |t| merge_params(t, schema)).await?;
    let service = plan(service_path(schema), || render_service(schema), |t| merge_service(t, schema)).await?;

    Ok(GenerationReport {
        params: commit(params).await?,
        service: commit(service).await?,
    })
}

/// Full `api` run against `source`.
pub async fn generate_api<S: SchemaSource + ?Sized>(
    source: &S,
    config: &GeneratorConfig,
    definition: Option<&DefinitionFile>,
) -> Result<GenerationReport, GenError> {
    let schema = build_schema(source, config, definition).await?;
    tracing::debug!(
        messages = schema.messages.len(),
        custom = schema.cus_messages.len(),
        enums = schema.enums.len(),
        "schema built"
    );
    write_artifacts(&schema).await
}
