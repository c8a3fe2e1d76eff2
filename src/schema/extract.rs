//! Schema extraction: column rows (strict) and definition-file blocks (best effort).

use crate::case::{to_camel_case, to_snake_case, to_upper_camel_case};
use crate::error::GenError;
use crate::schema::mapper::map_column;
use crate::schema::model::{Column, Field, FieldType, Message, Schema};
use crate::schema::proto::{DefinitionFile, FieldLine};
use std::collections::{HashMap, HashSet};

/// Bookkeeping columns never rendered.
pub const IGNORED_COLUMNS: &[&str] = &["create_time", "update_time"];

/// Drops columns of ignored tables and deny-listed bookkeeping columns.
pub fn filter_columns(cols: Vec<Column>, ignore_tables: &[String]) -> Vec<Column> {
    let ignored: HashSet<&str> = ignore_tables.iter().map(|s| s.trim()).collect();
    cols.into_iter()
        .filter(|c| !ignored.contains(c.table_name.as_str()))
        .filter(|c| !IGNORED_COLUMNS.contains(&c.column_name.as_str()))
        .collect()
}

/// Builds one message per table (first-seen order) and appends them with their enums to `schema`.
/// Nothing is appended unless every column maps.
pub fn schema_from_columns(schema: &mut Schema, cols: &[Column]) -> Result<(), GenError> {
    if cols.is_empty() {
        return Err(GenError::NoColumns);
    }

    let mut messages: Vec<Message> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut enums = Vec::new();

    for c in cols {
        let name = to_upper_camel_case(&c.table_name);
        let pos = match index.get(&name) {
            Some(&i) => i,
            None => {
                let comment = if c.table_comment.trim().is_empty() {
                    to_camel_case(&c.table_name)
                } else {
                    c.table_comment.clone()
                };
                messages.push(Message::new(name.clone(), comment));
                index.insert(name, messages.len() - 1);
                messages.len() - 1
            }
        };

        let mapped = map_column(c)?;
        if let Some(e) = mapped.enum_def {
            enums.push(e);
        }
        messages[pos].append_field(Field::new(
            mapped.ty,
            c.column_name.clone(),
            c.column_comment.clone(),
            c.column_name.clone(),
        ));
    }

    tracing::debug!(tables = messages.len(), enums = enums.len(), "messages built from columns");
    schema.messages.extend(messages);
    schema.enums.extend(enums);
    schema.finalize();
    Ok(())
}

/// Appends one custom message per directive name whose block exists in `def`. Missing blocks are skipped.
pub fn append_definition_messages(schema: &mut Schema, def: &DefinitionFile) {
    for name in &def.directives {
        let Some(block) = def.message(name) else {
            tracing::warn!(message = %name, "listed message has no block in definition file, skipping");
            continue;
        };
        let mut message = Message::new(to_upper_camel_case(name), String::new());
        for f in &block.fields {
            message.append_field(field_from_line(f));
        }
        schema.cus_messages.push(message);
    }
    schema.finalize();
}

fn field_from_line(f: &FieldLine) -> Field {
    let base = FieldType::from_token(&f.ty);
    let ty = if f.repeated {
        FieldType::Sequence(Box::new(base))
    } else {
        base
    };
    Field::new(ty, f.name.clone(), f.comment.clone(), to_snake_case(&f.name))
}
