//! Type blocks of the parameters artifact, and enum declarations.

use crate::case::{first_lower, first_upper, to_camel_case};
use crate::render::INDENT;
use crate::schema::{CrudMethod, Enum, Field, Message, Schema};

/// Columns left out of the base type.
pub const HIDDEN_FIELDS: &[&str] = &["version", "del_state", "delete_time"];

const BANNER: &str = "--------------------------------";

fn member_line(member: &str, ty: &str, tag: &str, comment: &str) -> String {
    if comment.is_empty() {
        format!("{INDENT}{INDENT}{}   {}  `{}`\n", member, ty, tag)
    } else {
        format!("{INDENT}{INDENT}{}   {}  `{}`  // {}\n", member, ty, tag, comment)
    }
}

fn json_line(member: &str, ty: &str, key: &str) -> String {
    member_line(member, ty, &format!("json:\"{}\"", key), "")
}

fn form_line(member: &str, ty: &str, key: &str) -> String {
    member_line(member, ty, &format!("form:\"{},optional\"", key), "")
}

fn field_line(f: &Field, default_comment: bool) -> String {
    let display = to_camel_case(&f.name);
    let comment = if f.comment.is_empty() && default_comment {
        display.clone()
    } else {
        f.comment.clone()
    };
    member_line(
        &first_upper(&display),
        &f.ty.to_string(),
        &format!("json:\"{}\"", f.column_name),
        &comment,
    )
}

fn open(name: &str) -> String {
    format!("{INDENT}{} {{\n", name)
}

fn close() -> String {
    format!("{INDENT}}}\n")
}

/// The message itself, minus hidden bookkeeping fields.
pub fn base_type(m: &Message) -> String {
    let mut out = open(&m.name);
    for f in m.fields.iter().filter(|f| !HIDDEN_FIELDS.contains(&f.name.as_str())) {
        out.push_str(&field_line(f, true));
    }
    out.push_str(&close());
    out
}

fn id_only(name: String) -> String {
    let mut out = open(&name);
    out.push_str(&json_line("Id", "int64", "id"));
    out.push_str(&close());
    out
}

pub fn create_resp(m: &Message) -> String {
    id_only(format!("Create{}Resp", first_upper(&m.name)))
}

pub fn update_req(m: &Message) -> String {
    let mut out = open(&format!("Update{}Req", first_upper(&m.name)));
    for f in &m.fields {
        out.push_str(&field_line(f, false));
    }
    out.push_str(&close());
    out
}

pub fn update_resp(m: &Message) -> String {
    id_only(format!("Update{}Resp", first_upper(&m.name)))
}

pub fn delete_req(m: &Message) -> String {
    id_only(format!("Delete{}Req", first_upper(&m.name)))
}

pub fn delete_resp(m: &Message) -> String {
    id_only(format!("Delete{}Resp", first_upper(&m.name)))
}

pub fn query_req(m: &Message) -> String {
    let mut out = open(&format!("Query{}Req", first_upper(&m.name)));
    out.push_str(&form_line("Id", "int64", "id"));
    out.push_str(&form_line("PageNo", "int64", "page_no"));
    out.push_str(&form_line("PageSize", "int64", "page_size"));
    out.push_str(&close());
    out
}

pub fn query_resp(m: &Message) -> String {
    let name = first_upper(&m.name);
    let mut out = open(&format!("Query{}Resp", name));
    out.push_str(&json_line(
        &format!("{}List", name),
        &format!("[]{}", name),
        &format!("{}_list", first_lower(&m.name)),
    ));
    out.push_str(&json_line("CurrPage", "int64", "curr_page"));
    out.push_str(&json_line("TotalPage", "int64", "total_page"));
    out.push_str(&json_line("TotalCount", "int64", "total_count"));
    out.push_str(&close());
    out
}

/// `type ( ... )` group for a table message: the base type plus the siblings of every generated method.
pub fn table_block(schema: &Schema, m: &Message) -> String {
    let mut parts = vec![base_type(m)];
    if schema.generates(CrudMethod::Insert) {
        parts.push(create_resp(m));
    }
    if schema.generates(CrudMethod::Update) {
        parts.push(update_req(m));
        parts.push(update_resp(m));
    }
    if schema.generates(CrudMethod::Delete) {
        parts.push(delete_req(m));
        parts.push(delete_resp(m));
    }
    if schema.generates(CrudMethod::Query) {
        parts.push(query_req(m));
        parts.push(query_resp(m));
    }
    group(&m.comment, &parts)
}

/// `type ( ... )` group for a definition-file message: base type only.
pub fn custom_block(m: &Message) -> String {
    group(&format!("customize_proto{}", m.name), &[base_type(m)])
}

fn group(title: &str, parts: &[String]) -> String {
    format!("//{BANNER}{}{BANNER}\ntype (\n{})\n\n", title, parts.join("\n"))
}

pub fn enum_decl(e: &Enum) -> String {
    let mut out = format!("// {}\nenum {} {{\n", e.comment, e.name);
    for f in &e.fields {
        out.push_str(&format!("{INDENT}{};\n", f));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn order() -> Message {
        let mut m = Message::new("Order", "orders");
        m.append_field(Field::new(FieldType::Int64, "order_id", "", "order_id"));
        m.append_field(Field::new(FieldType::String, "amount", "total", "amount"));
        m.append_field(Field::new(FieldType::Int64, "version", "", "version"));
        m
    }

    #[test]
    fn base_type_hides_bookkeeping_and_defaults_comments() {
        let out = base_type(&order());
        assert_eq!(
            out,
            "  Order {\n    OrderId   int64  `json:\"order_id\"`  // orderId\n    Amount   string  `json:\"amount\"`  // total\n  }\n"
        );
    }

    #[test]
    fn update_req_keeps_every_field() {
        let out = update_req(&order());
        assert!(out.starts_with("  UpdateOrderReq {\n"));
        assert!(out.contains("Version   int64  `json:\"version\"`\n"));
    }

    #[test]
    fn default_table_block_has_query_types_only() {
        let schema = Schema::new("shop", "./");
        let out = table_block(&schema, &order());
        assert!(out.starts_with("//--------------------------------orders--------------------------------\ntype (\n"));
        assert!(out.contains("QueryOrderReq {"));
        assert!(out.contains("OrderList   []Order  `json:\"order_list\"`"));
        assert!(!out.contains("CreateOrderResp"));
        assert!(out.ends_with(")\n\n"));
    }

    #[test]
    fn enum_declaration_lists_tagged_fields() {
        let e = Enum::from_values("OrderState", "state", &["new", "paid"]).unwrap();
        assert_eq!(enum_decl(&e), "// state\nenum OrderState {\n  NEW = 0;\n  PAID = 1;\n}\n");
    }
}
