//! JSON-LD `Product` lookup.

use scraper::{Html, Selector};
use serde_json::Value;

/// Parse every `application/ld+json` block that is valid JSON.
pub fn blocks(document: &Html) -> Vec<Value> {
    let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    document
        .select(&sel)
        .filter_map(|element| {
            let text = element.inner_html();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            serde_json::from_str::<Value>(text).ok()
        })
        .collect()
}

fn is_product(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Product" || t == "ProductGroup",
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| matches!(t.as_str(), Some("Product" | "ProductGroup"))),
        _ => false,
    }
}

/// First `Product` node, looking inside top-level arrays and `@graph`.
pub fn find_product(blocks: &[Value]) -> Option<&Value> {
    blocks.iter().find_map(|block| match block {
        Value::Array(items) => items.iter().find(|v| is_product(v)),
        _ => match block.get("@graph").and_then(Value::as_array) {
            Some(graph) => graph.iter().find(|v| is_product(v)),
            None => is_product(block).then_some(block),
        },
    })
}

pub fn name(product: &Value) -> Option<String> {
    product
        .get("name")
        .or_else(|| product.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn image(product: &Value) -> Option<String> {
    let image = product.get("image")?;
    let first = match image {
        Value::Array(items) => items.first()?,
        other => other,
    };
    first
        .as_str()
        .or_else(|| first.get("url").and_then(Value::as_str))
        .map(str::to_string)
}

/// Raw `offers.price` (or `lowPrice` of an aggregate offer), as text.
pub fn offer_price(product: &Value) -> Option<String> {
    let offers = product.get("offers")?;
    let offer = match offers {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let price = offer.get("price").or_else(|| offer.get("lowPrice"))?;
    match price {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
