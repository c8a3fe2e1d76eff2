//! Native column type -> field type. `enum`/`set` columns also produce an [`Enum`] definition.

use crate::case::to_upper_camel_case;
use crate::error::GenError;
use crate::schema::model::{Column, Enum, FieldType};
use regex::Regex;
use std::sync::OnceLock;

/// Result of mapping one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapped {
    pub ty: FieldType,
    pub enum_def: Option<Enum>,
}

fn enum_values_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:enum|set)\s*\((.+?)\)").expect("static regex"))
}

/// Enum type name for a column: table and column in UpperCamelCase.
pub fn enum_name(table: &str, column: &str) -> String {
    format!("{}{}", to_upper_camel_case(table), to_upper_camel_case(column))
}

pub fn map_column(col: &Column) -> Result<Mapped, GenError> {
    let scalar = |ty: FieldType| -> Result<Mapped, GenError> { Ok(Mapped { ty, enum_def: None }) };
    match col.data_type.to_lowercase().as_str() {
        "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" => scalar(FieldType::String),
        "enum" | "set" => {
            let values = enum_values(col)?;
            let name = enum_name(&col.table_name, &col.column_name);
            let def = Enum::from_values(&name, &col.column_comment, &values)?;
            Ok(Mapped {
                ty: FieldType::Enum(name),
                enum_def: Some(def),
            })
        }
        "blob" | "mediumblob" | "longblob" | "binary" | "varbinary" => scalar(FieldType::Bytes),
        // Epoch seconds; timezone is not modeled.
        "date" | "time" | "datetime" | "timestamp" => scalar(FieldType::Int64),
        "bool" | "boolean" => scalar(FieldType::Bool),
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => scalar(FieldType::Int64),
        // Kept as string so no precision is lost.
        "decimal" => scalar(FieldType::String),
        "double" | "float" => scalar(FieldType::Float64),
        _ => Err(GenError::UnmappableType {
            data_type: col.data_type.clone(),
            table: col.table_name.clone(),
            column: col.column_name.clone(),
        }),
    }
}

/// Literal list of an `enum('a','b')` / `set(...)` column type, in declaration order.
fn enum_values(col: &Column) -> Result<Vec<String>, GenError> {
    let malformed = || GenError::MalformedEnum {
        table: col.table_name.clone(),
        column: col.column_name.clone(),
        detail: col.column_type.clone(),
    };
    let caps = enum_values_re().captures(&col.column_type).ok_or_else(malformed)?;
    let list = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let values: Vec<String> = list
        .split(|c| c == ',' || c == '\'')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if values.is_empty() {
        return Err(malformed());
    }
    Ok(values)
}
