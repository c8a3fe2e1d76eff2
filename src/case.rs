//! Identifier case conversion: table/column names (snake_case) to type and member names (CamelCase) and back.

/// Convert snake_case to lower camelCase.
/// e.g. "user_id" -> "userId", "Order_item" -> "orderItem"
pub fn to_camel_case(s: &str) -> String {
    first_lower(&to_upper_camel_case(s))
}

/// Convert snake_case to UpperCamelCase. Existing capitals are kept, so already-camel input passes through.
/// e.g. "order_item" -> "OrderItem", "queryOrderList" -> "QueryOrderList"
pub fn to_upper_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert CamelCase (or camelCase) to snake_case.
/// e.g. "OrderItem" -> "order_item", "createdAt" -> "created_at"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_underscore = true;
    for c in s.chars() {
        if c.is_uppercase() {
            if !prev_underscore {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_underscore = false;
        } else {
            out.push(c);
            prev_underscore = c == '_';
        }
    }
    out
}

/// Uppercase the first character only.
pub fn first_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character only.
pub fn first_lower(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_to_camel_forms() {
        assert_eq!(to_upper_camel_case("order_item"), "OrderItem");
        assert_eq!(to_upper_camel_case("OrderItem"), "OrderItem");
        assert_eq!(to_camel_case("order_item"), "orderItem");
        assert_eq!(to_camel_case("id"), "id");
    }

    #[test]
    fn camel_to_snake() {
        assert_eq!(to_snake_case("OrderItem"), "order_item");
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_snake_case("order_Item"), "order_item");
        assert_eq!(to_snake_case("user"), "user");
    }

    #[test]
    fn first_char_helpers() {
        assert_eq!(first_upper("order"), "Order");
        assert_eq!(first_lower("Order"), "order");
        assert_eq!(first_upper(""), "");
    }
}
