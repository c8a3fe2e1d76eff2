//! Naming-convention dispatch: CRUD intent from an endpoint/request-type pair, and primary key lookup.

use crate::case::{to_snake_case, to_upper_camel_case};
use crate::store::SchemaSource;

/// Removed once from request types before matching (`OrderFilter` -> `Order`).
pub const FILTER_MARKER: &str = "Filter";
/// Trailing request suffix removed before matching (`CreateOrderReq` -> `CreateOrder`).
pub const REQUEST_SUFFIX: &str = "Req";

/// Key used when introspection cannot name the primary key.
pub const DEFAULT_PK_NAME: &str = "Id";
pub const DEFAULT_PK_VALUE: &str = "0";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrudKind {
    Create,
    Delete,
    QueryDetail,
    QueryList,
    Update,
    Unclassified,
}

/// CamelCase name with a trailing `Req` removed (`CreateOrderReq` -> `CreateOrder`).
fn normalize(name: &str) -> String {
    let name = to_upper_camel_case(name);
    if let Some(stripped) = name.strip_suffix(REQUEST_SUFFIX) {
        if !stripped.is_empty() {
            return stripped.to_string();
        }
    }
    name
}

fn strip_filter(name: &str) -> String {
    name.replacen(FILTER_MARKER, "", 1)
}

/// Model a request type names, with `Req` and the first `Filter` removed (`OrderFilterReq` -> `Order`).
pub fn base_type(request_type: &str) -> String {
    strip_filter(&normalize(request_type))
}

/// Exact-match classification; first rule wins in the order Create, Delete, QueryDetail, QueryList, Update.
/// The endpoint keeps any `Filter` it carries, except that the two query rules also accept it with
/// its first `Filter` removed (`QueryOrderFilterList`).
pub fn classify(endpoint: &str, request_type: &str) -> CrudKind {
    let endpoint = normalize(endpoint);
    let base = base_type(request_type);
    let query = |suffix: &str| {
        let name = format!("Query{}{}", base, suffix);
        endpoint == name || strip_filter(&endpoint) == name
    };

    if endpoint == format!("Create{}", base) {
        CrudKind::Create
    } else if endpoint == format!("Delete{}", base) {
        CrudKind::Delete
    } else if query("Detail") {
        CrudKind::QueryDetail
    } else if query("List") {
        CrudKind::QueryList
    } else if endpoint == format!("Update{}", base) {
        CrudKind::Update
    } else {
        CrudKind::Unclassified
    }
}

/// Primary key as it appears in generated logic: member name and zero-value literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryKey {
    pub name: String,
    pub zero_value: String,
}

impl Default for PrimaryKey {
    fn default() -> Self {
        PrimaryKey {
            name: DEFAULT_PK_NAME.to_string(),
            zero_value: DEFAULT_PK_VALUE.to_string(),
        }
    }
}

fn zero_value(data_type: &str) -> &'static str {
    match data_type.to_lowercase().as_str() {
        "char" | "varchar" | "text" | "longtext" | "mediumtext" | "tinytext" => "\"\"",
        _ => "0",
    }
}

/// Looks up the primary key of the table behind `model` (`OrderItem` -> `order_item`).
/// Never fails: any lookup problem falls back to [`PrimaryKey::default`].
pub async fn resolve_primary_key<S: SchemaSource + ?Sized>(source: &S, model: &str) -> PrimaryKey {
    let table = to_snake_case(model);
    match source.primary_key(&table).await {
        Ok(Some(pk)) => PrimaryKey {
            name: to_upper_camel_case(&pk.column_name),
            zero_value: zero_value(&pk.data_type).to_string(),
        },
        Ok(None) => {
            tracing::debug!(table = %table, "no primary key found, using default");
            PrimaryKey::default()
        }
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "primary key lookup failed, using default");
            PrimaryKey::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;
    use crate::schema::Column;
    use crate::store::{PrimaryKeyColumn, TableSelection};
    use async_trait::async_trait;

    #[test]
    fn create_update_delete_match_request_type() {
        assert_eq!(classify("CreateOrder", "Order"), CrudKind::Create);
        assert_eq!(classify("CreateOrderReq", "Order"), CrudKind::Create);
        assert_eq!(classify("CreateOrderReq", "OrderReq"), CrudKind::Create);
        assert_eq!(classify("DeleteOrder", "Order"), CrudKind::Delete);
        assert_eq!(classify("UpdateOrder", "Order"), CrudKind::Update);
    }

    #[test]
    fn query_rules_strip_filter() {
        assert_eq!(classify("QueryOrderList", "OrderFilter"), CrudKind::QueryList);
        assert_eq!(classify("QueryOrderDetail", "OrderFilter"), CrudKind::QueryDetail);
        assert_eq!(classify("QueryOrderFilterList", "OrderFilter"), CrudKind::QueryList);
        assert_eq!(base_type("OrderFilter"), "Order");
        assert_eq!(base_type("OrderReq"), "Order");
    }

    #[test]
    fn write_rules_do_not_strip_filter_from_the_endpoint() {
        assert_eq!(classify("CreateFilterRule", "FilterRule"), CrudKind::Unclassified);
        assert_eq!(classify("DeleteFilterRule", "FilterRuleReq"), CrudKind::Unclassified);
        assert_eq!(classify("CreateRule", "FilterRule"), CrudKind::Create);
        assert_eq!(base_type("FilterRule"), "Rule");

        assert_eq!(classify("CreateOrderFilter", "OrderFilter"), CrudKind::Unclassified);
        assert_eq!(classify("UpdateOrderFilter", "OrderFilter"), CrudKind::Unclassified);
        assert_eq!(classify("CreateOrder", "OrderFilter"), CrudKind::Create);
    }

    #[test]
    fn snake_case_names_are_camel_cased_first() {
        assert_eq!(classify("query_order_list", "order_filter"), CrudKind::QueryList);
    }

    #[test]
    fn anything_else_is_unclassified() {
        assert_eq!(classify("Ping", "Empty"), CrudKind::Unclassified);
        assert_eq!(classify("CreateOrders", "Order"), CrudKind::Unclassified);
    }

    struct Keys;

    #[async_trait]
    impl SchemaSource for Keys {
        async fn columns(&self, _: &TableSelection) -> Result<Vec<Column>, GenError> {
            Ok(Vec::new())
        }

        async fn primary_key(&self, table: &str) -> Result<Option<PrimaryKeyColumn>, GenError> {
            match table {
                "order_item" => Ok(Some(PrimaryKeyColumn {
                    column_name: "item_id".into(),
                    data_type: "bigint".into(),
                })),
                "user" => Ok(Some(PrimaryKeyColumn {
                    column_name: "uid".into(),
                    data_type: "varchar".into(),
                })),
                "broken" => Err(GenError::Db(sqlx::Error::PoolTimedOut)),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn primary_key_resolves_through_snake_case_table() {
        let pk = resolve_primary_key(&Keys, "OrderItem").await;
        assert_eq!(pk.name, "ItemId");
        assert_eq!(pk.zero_value, "0");
        let pk = resolve_primary_key(&Keys, "User").await;
        assert_eq!(pk.zero_value, "\"\"");
    }

    #[tokio::test]
    async fn primary_key_falls_back_on_missing_or_failed_lookup() {
        assert_eq!(resolve_primary_key(&Keys, "Unknown").await, PrimaryKey::default());
        let pk = resolve_primary_key(&Keys, "Broken").await;
        assert_eq!(pk.name, "Id");
        assert_eq!(pk.zero_value, "0");
    }
}
