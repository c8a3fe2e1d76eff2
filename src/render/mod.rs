//! Fresh rendering of the two artifacts. Region sentinels written here are what the merge engine reads back.
//!
//! Parameters artifact (`<dir>/<service>Param.api`):
//! ```text
//! syntax = "v1"
//!
//! // Already Exist Table:      <- table registry
//! // Exist Table End
//!
//! // Proto Customize Type:     <- custom registry
//! // Customize Type End
//!
//! // Type Record Start         <- type body
//! // Type Record End
//! ```
//!
//! Service artifact (`<dir>/<service>.api`): syntax, import of the parameters artifact, table registry,
//! `Enums Record Start/End`, then `service <name> {` with `Service Record Start/End` around the endpoints.

pub mod endpoints;
pub mod types;

use crate::schema::Schema;
use std::path::{Path, PathBuf};

pub use endpoints::endpoint_block;
pub use types::{custom_block, enum_decl, table_block};

pub const INDENT: &str = "  ";
pub const EXTENSION: &str = "api";

pub const TABLE_REGISTRY_START: &str = "Already Exist Table";
pub const TABLE_REGISTRY_END: &str = "Exist Table End";
pub const CUSTOM_REGISTRY_START: &str = "Proto Customize Type";
pub const CUSTOM_REGISTRY_END: &str = "Customize Type End";
pub const TYPE_RECORD_START: &str = "Type Record Start";
pub const TYPE_RECORD_END: &str = "Type Record End";
pub const ENUM_RECORD_START: &str = "Enums Record Start";
pub const ENUM_RECORD_END: &str = "Enums Record End";
pub const SERVICE_RECORD_START: &str = "Service Record Start";
pub const SERVICE_RECORD_END: &str = "Service Record End";

pub fn param_file_name(service_name: &str) -> String {
    format!("{}Param.{}", service_name, EXTENSION)
}

pub fn param_path(schema: &Schema) -> PathBuf {
    Path::new(&schema.dir).join(param_file_name(&schema.service_name))
}

pub fn service_path(schema: &Schema) -> PathBuf {
    Path::new(&schema.dir).join(format!("{}.{}", schema.service_name, EXTENSION))
}

/// One registry entry.
pub fn registry_line(name: &str) -> String {
    format!("// {}\n", name)
}

fn registry(start: &str, end: &str, names: impl Iterator<Item = String>) -> String {
    let mut out = format!("// {}:\n", start);
    for name in names {
        out.push_str(&registry_line(&name));
    }
    out.push_str(&format!("// {}\n", end));
    out
}

fn syntax_line(schema: &Schema) -> String {
    format!("syntax = \"{}\"\n", schema.syntax)
}

pub fn render_params(schema: &Schema) -> String {
    let mut out = syntax_line(schema);
    out.push('\n');
    out.push_str(&registry(
        TABLE_REGISTRY_START,
        TABLE_REGISTRY_END,
        schema.messages.iter().map(|m| m.name.clone()),
    ));
    out.push('\n');
    out.push_str(&registry(
        CUSTOM_REGISTRY_START,
        CUSTOM_REGISTRY_END,
        schema.cus_messages.iter().map(|m| m.name.clone()),
    ));
    out.push('\n');
    out.push_str(&format!("// {}\n", TYPE_RECORD_START));
    for m in &schema.messages {
        out.push_str(&table_block(schema, m));
    }
    for m in &schema.cus_messages {
        out.push_str(&custom_block(m));
    }
    out.push_str(&format!("// {}\n", TYPE_RECORD_END));
    out
}

pub fn render_service(schema: &Schema) -> String {
    let mut out = syntax_line(schema);
    out.push('\n');
    out.push_str("import (\n");
    for import in &schema.imports {
        out.push_str(&format!("\t\"{}\"\n", import));
    }
    out.push_str(")\n\n");
    out.push_str(&registry(
        TABLE_REGISTRY_START,
        TABLE_REGISTRY_END,
        schema.messages.iter().map(|m| m.name.clone()),
    ));
    out.push('\n');
    out.push_str(&format!("// {}\n", ENUM_RECORD_START));
    for e in &schema.enums {
        out.push_str(&enum_decl(e));
    }
    out.push_str(&format!("// {}\n", ENUM_RECORD_END));
    out.push('\n');
    out.push_str("// ------------------------------------\n");
    out.push_str("// api Func\n");
    out.push_str("// ------------------------------------\n\n");
    out.push_str(&format!("service {} {{\n", schema.service_name));
    out.push_str(&format!("\t// {}\n", SERVICE_RECORD_START));
    for m in &schema.messages {
        out.push_str(&endpoint_block(schema, m));
    }
    out.push_str(&format!("\t// {}\n", SERVICE_RECORD_END));
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType, Message};

    fn schema() -> Schema {
        let mut s = Schema::new("shop", "/tmp/out");
        let mut user = Message::new("User", "users");
        user.append_field(Field::new(FieldType::Int64, "id", "", "id"));
        s.messages.push(user);
        s.messages.push(Message::new("Order", "orders"));
        s.cus_messages.push(Message::new("PageInfo", ""));
        s.append_import(param_file_name("shop"));
        s.finalize();
        s
    }

    #[test]
    fn artifact_paths() {
        let s = schema();
        assert_eq!(param_path(&s), PathBuf::from("/tmp/out/shopParam.api"));
        assert_eq!(service_path(&s), PathBuf::from("/tmp/out/shop.api"));
    }

    #[test]
    fn params_artifact_layout() {
        let out = render_params(&schema());
        assert!(out.starts_with(
            "syntax = \"v1\"\n\n// Already Exist Table:\n// Order\n// User\n// Exist Table End\n\n// Proto Customize Type:\n// PageInfo\n// Customize Type End\n\n// Type Record Start\n"
        ));
        assert!(out.ends_with("// Type Record End\n"));
        let order = out.find("orders---").unwrap();
        let user = out.find("users---").unwrap();
        let custom = out.find("customize_protoPageInfo").unwrap();
        assert!(order < user && user < custom);
    }

    #[test]
    fn service_artifact_layout() {
        let out = render_service(&schema());
        assert!(out.contains("import (\n\t\"shopParam.api\"\n)\n"));
        assert!(out.contains("// Enums Record Start\n// Enums Record End\n"));
        assert!(out.contains("service shop {\n\t// Service Record Start\n"));
        assert!(out.ends_with("\t// Service Record End\n}\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render_params(&schema()), render_params(&schema()));
        assert_eq!(render_service(&schema()), render_service(&schema()));
    }
}
