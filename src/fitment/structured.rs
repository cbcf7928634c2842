//! Fitment arrays embedded as JSON script blocks

use super::cross_product;
use crate::extract::page::ProductPage;
use crate::extract::FitmentRow;
use serde_json::Value;

pub(super) fn expand(page: &ProductPage) -> Option<Vec<FitmentRow>> {
    let mut blocks = page.json_blocks();
    // product_data first, then the remaining blocks in document order
    blocks.sort_by_key(|b| b.id.as_deref() != Some("product_data"));

    blocks
        .iter()
        .filter_map(|block| fitment_entries(&block.value))
        .map(|entries| entries.iter().flat_map(entry_rows).collect::<Vec<_>>())
        .find(|rows| !rows.is_empty())
}

/// The fitment array in a block: either under a `fitment` key or the block
/// itself when it is an array of vehicle objects
fn fitment_entries(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Object(map) => map.get("fitment").and_then(Value::as_array),
        Value::Array(items) if items.iter().any(is_vehicle) => Some(items),
        _ => None,
    }
}

fn is_vehicle(value: &Value) -> bool {
    value.get("model").is_some() || value.get("year").is_some()
}

fn entry_rows(entry: &Value) -> Vec<FitmentRow> {
    if !entry.is_object() {
        return Vec::new();
    }
    let year = scalar(entry.get("year"));
    let make = scalar(entry.get("make"));
    let model = scalar(entry.get("model"));
    let trims = list(entry.get("trims").or_else(|| entry.get("trim")));
    let engines = list(entry.get("engines").or_else(|| entry.get("engine")));

    cross_product(&year, &make, &model, &trims, &engines)
}

fn scalar(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Arrays keep blank entries so `[""]` still yields a row; strings split on commas
fn list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|v| scalar(Some(v))).collect(),
        Some(Value::String(s)) => super::split_list(s),
        Some(v @ Value::Number(_)) => vec![scalar(Some(v))],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(json: &str) -> ProductPage {
        let markup = format!(
            r#"<html><body><script id="product_data" type="application/json">{json}</script></body></html>"#
        );
        ProductPage::parse("https://www.acurapartswarehouse.com/p.html", &markup)
    }

    #[test]
    fn test_trims_by_engines() {
        let page = page_with(
            r#"{"fitment":[{"year":2021,"make":"Acura","model":"TLX","trims":["Base","A-Spec"],"engines":["2.0L","3.0L"]}]}"#,
        );
        let rows = expand(&page).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.year == "2021" && r.model == "TLX"));
        assert_eq!(rows[1].trim, "Base");
        assert_eq!(rows[1].engine, "3.0L");
    }

    #[test]
    fn test_blank_engine_entry_keeps_row() {
        let page = page_with(
            r#"{"fitment":[{"year":2021,"make":"Acura","model":"TLX","trims":["Base","A-Spec"],"engines":[""]}]}"#,
        );
        let rows = expand(&page).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].engine, "");
    }

    #[test]
    fn test_missing_lists_yield_single_row() {
        let page = page_with(r#"{"fitment":[{"year":"2019","make":"Acura","model":"RDX","trims":[],"engines":[]}]}"#);
        let rows = expand(&page).unwrap();
        assert_eq!(rows, vec![FitmentRow::new("2019", "Acura", "RDX", "", "")]);
    }

    #[test]
    fn test_comma_separated_strings() {
        let page = page_with(
            r#"{"fitment":[{"year":"2020","make":"Acura","model":"MDX","trims":"Base, Advance","engines":"3.5L"}]}"#,
        );
        let rows = expand(&page).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].trim, "Advance");
        assert_eq!(rows[1].engine, "3.5L");
    }

    #[test]
    fn test_no_fitment_key() {
        let page = page_with(r#"{"sku":"42700-TK4-A51"}"#);
        assert!(expand(&page).is_none());

        let page = page_with(r#"{"fitment":[]}"#);
        assert!(expand(&page).is_none());
    }
}
