//! Line tokenizer for interface-definition (.proto) files.
//!
//! Produces a small typed IR instead of matching whole blocks with patterns:
//! - the directive section between `Api Struct Gen` and `Struct Gen End` lists the messages to extract;
//! - `message Name { ... }` blocks with one field per line (`[repeated] type name = tag; // comment`);
//! - `service Name { rpc ... }` blocks, with `//` lines directly above an rpc kept as its doc.
//!
//! Parsing is best effort: lines that do not fit the field layout are dropped.

use regex::Regex;
use std::sync::OnceLock;

pub const DIRECTIVE_START: &str = "Api Struct Gen";
pub const DIRECTIVE_END: &str = "Struct Gen End";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefinitionFile {
    /// Message names listed in the directive section, in order.
    pub directives: Vec<String>,
    pub messages: Vec<MessageBlock>,
    pub services: Vec<ServiceBlock>,
}

impl DefinitionFile {
    pub fn message(&self, name: &str) -> Option<&MessageBlock> {
        self.messages.iter().find(|m| m.name == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageBlock {
    pub name: String,
    pub fields: Vec<FieldLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLine {
    pub repeated: bool,
    pub ty: String,
    pub name: String,
    pub comment: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceBlock {
    pub name: String,
    pub rpcs: Vec<RpcMethod>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RpcMethod {
    pub name: String,
    pub request_type: String,
    pub returns_type: String,
    pub streams_request: bool,
    pub streams_returns: bool,
    pub doc: Vec<String>,
}

enum State {
    Top,
    Directives,
    Message(MessageBlock),
    Service(ServiceBlock),
}

fn rpc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rpc\s+(\w+)\s*\(\s*(stream\s+)?([\w.]+)\s*\)\s*returns\s*\(\s*(stream\s+)?([\w.]+)\s*\)")
            .expect("static regex")
    })
}

/// Name of a block header like `message Foo {` / `service Bar{`.
fn block_name<'a>(rest: &'a str) -> &'a str {
    rest.split(|c: char| c == '{' || c.is_whitespace())
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// Closes on the same line, e.g. `message Empty {}`.
fn closes_inline(line: &str) -> bool {
    match (line.find('{'), line.rfind('}')) {
        (Some(open), Some(close)) => close > open,
        _ => false,
    }
}

pub fn parse_definition(text: &str) -> DefinitionFile {
    let mut out = DefinitionFile::default();
    let mut state = State::Top;
    let mut doc: Vec<String> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        state = match state {
            State::Top => {
                if line.contains(DIRECTIVE_START) {
                    State::Directives
                } else if let Some(rest) = line.strip_prefix("message ") {
                    let block = MessageBlock {
                        name: block_name(rest).to_string(),
                        fields: Vec::new(),
                    };
                    if closes_inline(line) {
                        out.messages.push(block);
                        State::Top
                    } else {
                        State::Message(block)
                    }
                } else if let Some(rest) = line.strip_prefix("service ") {
                    State::Service(ServiceBlock {
                        name: block_name(rest).to_string(),
                        rpcs: Vec::new(),
                    })
                } else {
                    State::Top
                }
            }
            State::Directives => {
                if line.contains(DIRECTIVE_END) {
                    State::Top
                } else {
                    let name = line.replace("//", "");
                    let name = name.trim();
                    if !name.is_empty() {
                        out.directives.push(name.to_string());
                    }
                    State::Directives
                }
            }
            State::Message(mut block) => {
                if line.starts_with('}') {
                    out.messages.push(block);
                    State::Top
                } else {
                    match parse_field_line(line) {
                        Some(field) => block.fields.push(field),
                        None if !line.is_empty() && !line.starts_with("//") => {
                            tracing::debug!(message = %block.name, line = %line, "line is not a plain field, skipped");
                        }
                        None => {}
                    }
                    State::Message(block)
                }
            }
            State::Service(mut block) => {
                if line.starts_with('}') {
                    out.services.push(block);
                    doc.clear();
                    State::Top
                } else if let Some(comment) = line.strip_prefix("//") {
                    doc.push(comment.trim().to_string());
                    State::Service(block)
                } else {
                    if let Some(mut rpc) = parse_rpc_line(line) {
                        rpc.doc = std::mem::take(&mut doc);
                        block.rpcs.push(rpc);
                    }
                    doc.clear();
                    State::Service(block)
                }
            }
        };
    }

    match state {
        State::Message(block) => {
            tracing::warn!(message = %block.name, "message block not closed before end of file");
            out.messages.push(block);
        }
        State::Service(block) => out.services.push(block),
        State::Top | State::Directives => {}
    }
    out
}

/// `[repeated|optional] type name = tag; // comment`. Returns None for anything else, `map<..>` included.
pub fn parse_field_line(line: &str) -> Option<FieldLine> {
    let (code, comment) = match line.find("//") {
        Some(i) => (&line[..i], line[i + 2..].trim()),
        None => (line, ""),
    };
    let code = code.replace('=', " = ");
    let mut tokens: Vec<&str> = code.split_whitespace().collect();
    let repeated = tokens.first() == Some(&"repeated");
    if repeated || tokens.first() == Some(&"optional") {
        tokens.remove(0);
    }
    if tokens.len() < 4 || tokens[2] != "=" || matches!(tokens[0], "option" | "reserved") {
        return None;
    }
    Some(FieldLine {
        repeated,
        ty: tokens[0].to_string(),
        name: tokens[1].to_string(),
        comment: comment.to_string(),
    })
}

fn parse_rpc_line(line: &str) -> Option<RpcMethod> {
    let caps = rpc_re().captures(line)?;
    Some(RpcMethod {
        name: caps[1].to_string(),
        streams_request: caps.get(2).is_some(),
        request_type: caps[3].to_string(),
        streams_returns: caps.get(4).is_some(),
        returns_type: caps[5].to_string(),
        doc: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"syntax = "proto3";

// Api Struct Gen
// order_filter
// PageInfo
// Missing
// Struct Gen End

message order_filter {
  int64 id = 1; // order id
  repeated Item items = 2; // line items
  string note=3;
  // retired = 4;
  option deprecated = true;
}

message PageInfo {}

service Order {
  // create an order
  rpc CreateOrder(Order) returns (CreateOrderResp);
  rpc Watch(stream WatchReq) returns (stream WatchResp);
}
"#;

    #[test]
    fn directives_are_collected_in_order() {
        let def = parse_definition(SAMPLE);
        assert_eq!(def.directives, vec!["order_filter", "PageInfo", "Missing"]);
    }

    #[test]
    fn message_fields_follow_line_layout() {
        let def = parse_definition(SAMPLE);
        let block = def.message("order_filter").unwrap();
        let names: Vec<&str> = block.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "items", "note"]);
        assert!(block.fields[1].repeated);
        assert_eq!(block.fields[1].ty, "Item");
        assert_eq!(block.fields[0].comment, "order id");
        assert_eq!(block.fields[2].ty, "string");
        assert_eq!(def.message("PageInfo").unwrap().fields.len(), 0);
        assert!(def.message("Missing").is_none());
    }

    #[test]
    fn optional_is_dropped_and_maps_are_skipped() {
        let f = parse_field_line("  optional float ratio = 4; // share").unwrap();
        assert_eq!((f.ty.as_str(), f.name.as_str(), f.repeated), ("float", "ratio", false));
        assert_eq!(f.comment, "share");
        assert!(parse_field_line("  map<string, int64> counts = 5;").is_none());

        let def = parse_definition("message Stats {\n  optional float ratio = 1;\n  map<string, int64> counts = 2;\n}\n");
        let names: Vec<&str> = def.message("Stats").unwrap().fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ratio"]);
    }

    #[test]
    fn rpc_declarations_keep_doc_and_stream_flags() {
        let def = parse_definition(SAMPLE);
        assert_eq!(def.services.len(), 1);
        let rpcs = &def.services[0].rpcs;
        assert_eq!(rpcs[0].name, "CreateOrder");
        assert_eq!(rpcs[0].request_type, "Order");
        assert_eq!(rpcs[0].doc, vec!["create an order"]);
        assert!(rpcs[1].streams_request && rpcs[1].streams_returns);
        assert!(rpcs[1].doc.is_empty());
    }

    #[test]
    fn short_or_commented_lines_are_skipped() {
        assert!(parse_field_line("// int64 id = 1;").is_none());
        assert!(parse_field_line("reserved 4;").is_none());
        assert!(parse_field_line("int64 id").is_none());
    }
}
