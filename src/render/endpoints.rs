//! Endpoint declarations inside the `service` block of the service artifact.

use crate::case::{first_lower, first_upper};
use crate::schema::{CrudMethod, Message, Schema};

const BANNER: &str = "-----------------------";

/// Order in which method families are emitted for one message.
const METHOD_ORDER: [CrudMethod; 4] = [CrudMethod::Insert, CrudMethod::Update, CrudMethod::Delete, CrudMethod::Query];

struct Endpoint {
    doc: String,
    handler: String,
    verb: &'static str,
    path: String,
    request: String,
    response: String,
}

impl Endpoint {
    fn render(&self) -> String {
        format!(
            "\t@doc \"{}\"\n\t@handler {}\n\t{} {} ({}) returns ({})\n\n",
            self.doc, self.handler, self.verb, self.path, self.request, self.response
        )
    }
}

fn endpoints_for(method: CrudMethod, m: &Message) -> Vec<Endpoint> {
    let name = first_upper(&m.name);
    let path = format!("/{}", first_lower(&m.name));
    match method {
        CrudMethod::Insert => vec![Endpoint {
            doc: format!("{} create [auto]", m.name),
            handler: format!("create{}", name),
            verb: "post",
            path: format!("{}/create", path),
            request: name.clone(),
            response: format!("Create{}Resp", name),
        }],
        CrudMethod::Update => vec![Endpoint {
            doc: format!("{} update [auto]", m.name),
            handler: format!("update{}", name),
            verb: "post",
            path: format!("{}/update", path),
            request: format!("Update{}Req", name),
            response: format!("Update{}Resp", name),
        }],
        CrudMethod::Delete => vec![Endpoint {
            doc: format!("{} delete [auto]", m.name),
            handler: format!("delete{}", name),
            verb: "post",
            path: format!("{}/delete", path),
            request: format!("Delete{}Req", name),
            response: format!("Delete{}Resp", name),
        }],
        CrudMethod::Query => vec![
            Endpoint {
                doc: format!("{} list query [auto]", m.name),
                handler: format!("query{}List", name),
                verb: "get",
                path: format!("{}/query", path),
                request: format!("Query{}Req", name),
                response: format!("Query{}Resp", name),
            },
            Endpoint {
                doc: format!("{} query [auto]", m.name),
                handler: format!("query{}", name),
                verb: "get",
                path,
                request: format!("Query{}Req", name),
                response: name,
            },
        ],
    }
}

/// All endpoint declarations for one table message, headed by its comment banner.
pub fn endpoint_block(schema: &Schema, m: &Message) -> String {
    let mut out = format!("\t//{BANNER}{}{BANNER}\n", m.comment);
    for method in METHOD_ORDER.into_iter().filter(|&method| schema.generates(method)) {
        for ep in endpoints_for(method, m) {
            out.push_str(&ep.render());
        }
    }
    out
}
