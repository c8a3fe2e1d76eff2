//! Intermediate model: columns in, messages/enums out. Built once per run, read by the renderers and the merge engine.

use crate::error::GenError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Syntax tag written at the top of every artifact.
pub const SYNTAX: &str = "v1";

/// One row of column metadata as read from the database catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Column {
    pub table_name: String,
    pub column_name: String,
    pub is_nullable: bool,
    /// Native type without facets, e.g. "varchar".
    pub data_type: String,
    pub character_maximum_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    /// Full native type, e.g. "enum('a','b')" or "varchar(64)".
    pub column_type: String,
    pub column_comment: String,
    pub table_comment: String,
}

/// Generated endpoint families. Parsed from config strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrudMethod {
    Insert,
    Update,
    Query,
    Delete,
}

impl std::str::FromStr for CrudMethod {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert" | "create" => Ok(CrudMethod::Insert),
            "update" => Ok(CrudMethod::Update),
            "query" => Ok(CrudMethod::Query),
            "delete" => Ok(CrudMethod::Delete),
            other => Err(crate::error::ConfigError::UnknownCrudMethod(other.to_string())),
        }
    }
}

/// Semantic field type. Column sources only produce the scalar variants and `Enum`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bytes,
    Bool,
    Int64,
    Float64,
    /// Reference to an [`Enum`] by name.
    Enum(String),
    /// Fixed-width scalar from a definition file, already in its Go spelling (e.g. "int32", "float32").
    Scalar(&'static str),
    /// Message type carried through from a definition file (e.g. "OrderItem").
    Named(String),
    /// `repeated` field in a definition file.
    Sequence(Box<FieldType>),
}

impl FieldType {
    /// Read a definition-file type token. Scalars map onto Go types; anything else names a message.
    pub fn from_token(token: &str) -> Self {
        match token {
            "string" => FieldType::String,
            "bytes" => FieldType::Bytes,
            "bool" => FieldType::Bool,
            "int64" | "sint64" | "sfixed64" => FieldType::Int64,
            "float64" | "double" => FieldType::Float64,
            "float" | "float32" => FieldType::Scalar("float32"),
            "int32" | "sint32" | "sfixed32" => FieldType::Scalar("int32"),
            "uint32" | "fixed32" => FieldType::Scalar("uint32"),
            "uint64" | "fixed64" => FieldType::Scalar("uint64"),
            other => FieldType::Named(other.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Bytes => f.write_str("[]byte"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int64 => f.write_str("int64"),
            FieldType::Float64 => f.write_str("float64"),
            FieldType::Scalar(name) => f.write_str(name),
            FieldType::Enum(name) | FieldType::Named(name) => f.write_str(name),
            FieldType::Sequence(inner) => match inner.as_ref() {
                FieldType::Named(name) => write!(f, "[]*{}", name),
                other => write!(f, "[]{}", other),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub ty: FieldType,
    /// Display name as found in the source (column name or proto field name).
    pub name: String,
    pub comment: String,
    /// snake_case key used in json/form tags.
    pub column_name: String,
}

impl Field {
    pub fn new(ty: FieldType, name: impl Into<String>, comment: impl Into<String>, column_name: impl Into<String>) -> Self {
        Field {
            ty,
            name: name.into(),
            comment: comment.into(),
            column_name: column_name.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub comment: String,
    pub fields: Vec<Field>,
}

impl Message {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Message {
            name: name.into(),
            comment: comment.into(),
            fields: Vec::new(),
        }
    }

    pub fn append_field(&mut self, field: Field) {
        self.fields.push(field);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumField {
    name: String,
    tag: i32,
}

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w]+").expect("static regex"))
}

impl EnumField {
    /// Upper-cases `name` and folds every run of non-word characters into `_`.
    pub fn new(name: &str, tag: i32) -> Self {
        let upper = name.to_uppercase();
        EnumField {
            name: non_word().replace_all(&upper, "_").into_owned(),
            tag,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> i32 {
        self.tag
    }
}

impl fmt::Display for EnumField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.tag)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub comment: String,
    pub fields: Vec<EnumField>,
}

impl Enum {
    /// Builds an enum whose field tags are the ordinal positions of `values`.
    pub fn from_values<S: AsRef<str>>(name: &str, comment: &str, values: &[S]) -> Result<Self, GenError> {
        let mut e = Enum {
            name: name.to_string(),
            comment: comment.to_string(),
            fields: Vec::with_capacity(values.len()),
        };
        for (i, v) in values.iter().enumerate() {
            e.append_field(EnumField::new(v.as_ref(), i as i32))?;
        }
        Ok(e)
    }

    pub fn append_field(&mut self, field: EnumField) -> Result<(), GenError> {
        if let Some(existing) = self.fields.iter().find(|f| f.tag == field.tag) {
            return Err(GenError::EnumTagCollision {
                tag: field.tag,
                field: existing.name.clone(),
            });
        }
        self.fields.push(field);
        Ok(())
    }
}

/// Root aggregate consumed by the renderers and the merge engine.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub syntax: String,
    pub service_name: String,
    pub dir: String,
    pub imports: Vec<String>,
    pub messages: Vec<Message>,
    pub cus_messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub crud_methods: Vec<CrudMethod>,
}

impl Schema {
    pub fn new(service_name: impl Into<String>, dir: impl Into<String>) -> Self {
        Schema {
            syntax: SYNTAX.to_string(),
            service_name: service_name.into(),
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Adds an import unless it is already present.
    pub fn append_import(&mut self, import: impl Into<String>) {
        let import = import.into();
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Sorts every collection by name so rendered output is stable across runs.
    pub fn finalize(&mut self) {
        self.imports.sort();
        self.imports.dedup();
        self.messages.sort_by(|a, b| a.name.cmp(&b.name));
        self.cus_messages.sort_by(|a, b| a.name.cmp(&b.name));
        self.enums.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Configured methods, or query only when none were selected.
    pub fn effective_crud_methods(&self) -> Vec<CrudMethod> {
        if self.crud_methods.is_empty() {
            vec![CrudMethod::Query]
        } else {
            self.crud_methods.clone()
        }
    }

    pub fn generates(&self, method: CrudMethod) -> bool {
        self.effective_crud_methods().contains(&method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_tags_follow_value_order() {
        let e = Enum::from_values("OrderState", "state", &["a", "b", "c"]).unwrap();
        let tags: Vec<i32> = e.fields.iter().map(EnumField::tag).collect();
        assert_eq!(tags, vec![0, 1, 2]);
        assert_eq!(e.fields[0].name(), "A");
    }

    #[test]
    fn enum_field_names_fold_non_word_runs() {
        assert_eq!(EnumField::new("in-progress", 0).name(), "IN_PROGRESS");
        assert_eq!(EnumField::new("on hold / paused", 1).name(), "ON_HOLD_PAUSED");
    }

    #[test]
    fn duplicate_enum_tag_is_rejected() {
        let mut e = Enum::from_values("Kind", "", &["x"]).unwrap();
        let err = e.append_field(EnumField::new("y", 0)).unwrap_err();
        assert!(matches!(err, GenError::EnumTagCollision { tag: 0, ref field } if field == "X"));
    }

    #[test]
    fn finalize_sorts_and_dedups() {
        let mut s = Schema::new("shop", "./");
        s.messages.push(Message::new("User", ""));
        s.messages.push(Message::new("Order", ""));
        s.enums.push(Enum { name: "Z".into(), ..Default::default() });
        s.enums.push(Enum { name: "A".into(), ..Default::default() });
        s.append_import("b.api");
        s.append_import("a.api");
        s.append_import("b.api");
        s.finalize();
        assert_eq!(s.messages[0].name, "Order");
        assert_eq!(s.enums[0].name, "A");
        assert_eq!(s.imports, vec!["a.api", "b.api"]);
    }

    #[test]
    fn crud_methods_default_to_query() {
        let mut s = Schema::new("shop", "./");
        assert_eq!(s.effective_crud_methods(), vec![CrudMethod::Query]);
        s.crud_methods = vec![CrudMethod::Insert];
        assert!(s.generates(CrudMethod::Insert));
        assert!(!s.generates(CrudMethod::Query));
    }

    #[test]
    fn sequence_of_named_renders_pointer_slice() {
        let ty = FieldType::Sequence(Box::new(FieldType::Named("Item".into())));
        assert_eq!(ty.to_string(), "[]*Item");
        assert_eq!(FieldType::Sequence(Box::new(FieldType::Int64)).to_string(), "[]int64");
    }

    #[test]
    fn definition_scalars_use_go_spelling() {
        assert_eq!(FieldType::from_token("float").to_string(), "float32");
        assert_eq!(FieldType::from_token("double").to_string(), "float64");
        assert_eq!(FieldType::from_token("sint32").to_string(), "int32");
        assert_eq!(FieldType::from_token("fixed64").to_string(), "uint64");
        assert_eq!(FieldType::from_token("sfixed64"), FieldType::Int64);
        assert_eq!(FieldType::from_token("OrderItem"), FieldType::Named("OrderItem".into()));
        let floats = FieldType::Sequence(Box::new(FieldType::from_token("float")));
        assert_eq!(floats.to_string(), "[]float32");
    }
}
