//! Additive merge of a freshly built schema into a previously generated artifact.
//!
//! Only whole entities are added: a name already listed in a registry is never rendered again,
//! even if its fields changed upstream, so hand edits to its generated block survive.
//! New entries go in model order just before each region's end sentinel.

pub mod document;

use crate::render::{
    custom_block, endpoint_block, enum_decl, registry_line, table_block, CUSTOM_REGISTRY_END, CUSTOM_REGISTRY_START,
    ENUM_RECORD_END, ENUM_RECORD_START, SERVICE_RECORD_END, SERVICE_RECORD_START, TABLE_REGISTRY_END,
    TABLE_REGISTRY_START, TYPE_RECORD_END, TYPE_RECORD_START,
};
use crate::schema::{Message, Schema};
pub use document::{Document, Region, RegionKind, RegionSpec, Segment};

/// Keyword of the service declaration; its line opens the service body when no start marker precedes the endpoints.
pub const SERVICE_KEYWORD: &str = "service";

pub const PARAM_REGIONS: &[RegionSpec] = &[
    RegionSpec {
        kind: RegionKind::TableRegistry,
        start: TABLE_REGISTRY_START,
        end: TABLE_REGISTRY_END,
        opener: None,
    },
    RegionSpec {
        kind: RegionKind::CustomRegistry,
        start: CUSTOM_REGISTRY_START,
        end: CUSTOM_REGISTRY_END,
        opener: None,
    },
    RegionSpec {
        kind: RegionKind::TypeBody,
        start: TYPE_RECORD_START,
        end: TYPE_RECORD_END,
        opener: None,
    },
];

pub const SERVICE_REGIONS: &[RegionSpec] = &[
    RegionSpec {
        kind: RegionKind::TableRegistry,
        start: TABLE_REGISTRY_START,
        end: TABLE_REGISTRY_END,
        opener: None,
    },
    RegionSpec {
        kind: RegionKind::EnumRecords,
        start: ENUM_RECORD_START,
        end: ENUM_RECORD_END,
        opener: None,
    },
    RegionSpec {
        kind: RegionKind::ServiceBody,
        start: SERVICE_RECORD_START,
        end: SERVICE_RECORD_END,
        opener: Some(SERVICE_KEYWORD),
    },
];

/// Merged text plus the names that were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    pub added: Vec<String>,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Messages whose names are missing from `registry`. Needs both the registry and its body region;
/// if either is absent nothing is added for that kind.
fn new_entities<'a>(doc: &Document, registry: RegionKind, body: RegionKind, model: &'a [Message]) -> Vec<&'a Message> {
    let Some(existing) = doc.region(registry).map(Region::registry_names) else {
        tracing::warn!(region = ?registry, "registry region missing, nothing merged for it");
        return Vec::new();
    };
    if doc.region(body).is_none() {
        tracing::warn!(region = ?body, "body region missing, nothing merged for it");
        return Vec::new();
    }
    model.iter().filter(|m| !existing.contains(&m.name)).collect()
}

fn register(doc: &mut Document, kind: RegionKind, added: &[&Message]) {
    if let Some(region) = doc.region_mut(kind) {
        for m in added {
            region.append(registry_line(&m.name));
        }
    }
}

/// Merges into an existing parameters artifact.
pub fn merge_params(existing: &str, schema: &Schema) -> MergeOutcome {
    let mut doc = Document::parse(existing, PARAM_REGIONS);
    let tables = new_entities(&doc, RegionKind::TableRegistry, RegionKind::TypeBody, &schema.messages);
    let customs = new_entities(&doc, RegionKind::CustomRegistry, RegionKind::TypeBody, &schema.cus_messages);

    register(&mut doc, RegionKind::TableRegistry, &tables);
    register(&mut doc, RegionKind::CustomRegistry, &customs);
    if let Some(body) = doc.region_mut(RegionKind::TypeBody) {
        for m in &tables {
            body.append(table_block(schema, m));
        }
        for m in &customs {
            body.append(custom_block(m));
        }
    }

    let added = tables.iter().chain(customs.iter()).map(|m| m.name.clone()).collect();
    MergeOutcome {
        text: doc.render(),
        added,
    }
}

/// Merges into an existing service artifact.
pub fn merge_service(existing: &str, schema: &Schema) -> MergeOutcome {
    let mut doc = Document::parse(existing, SERVICE_REGIONS);
    let tables = new_entities(&doc, RegionKind::TableRegistry, RegionKind::ServiceBody, &schema.messages);
    register(&mut doc, RegionKind::TableRegistry, &tables);
    if let Some(body) = doc.region_mut(RegionKind::ServiceBody) {
        for m in &tables {
            body.append(endpoint_block(schema, m));
        }
    }
    let mut added: Vec<String> = tables.iter().map(|m| m.name.clone()).collect();

    let existing = doc.region(RegionKind::EnumRecords).map(Region::enum_names);
    let enums: Vec<_> = schema
        .enums
        .iter()
        .filter(|e| existing.as_ref().map_or(true, |names| !names.contains(&e.name)))
        .collect();
    if !enums.is_empty() {
        let decls: Vec<String> = enums.iter().map(|e| enum_decl(e)).collect();
        let placed = match doc.region_mut(RegionKind::EnumRecords) {
            Some(records) => {
                decls.into_iter().for_each(|d| records.append(d));
                true
            }
            None => doc.insert_after(
                RegionKind::TableRegistry,
                vec![
                    Segment::Verbatim(vec!["\n".to_string()]),
                    Segment::Region(Region {
                        kind: RegionKind::EnumRecords,
                        start: format!("// {}\n", ENUM_RECORD_START),
                        content: decls,
                        end: format!("// {}\n", ENUM_RECORD_END),
                    }),
                ],
            ),
        };
        if placed {
            added.extend(enums.iter().map(|e| e.name.clone()));
        } else {
            tracing::warn!("no enum records region and no table registry to place one after, enums not merged");
        }
    }

    MergeOutcome {
        text: doc.render(),
        added,
    }
}
