//! Year / make / model tables

use super::{cross_product, expand_years, split_list};
use crate::extract::page::{element_text, ProductPage};
use crate::extract::FitmentRow;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static YEAR_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"((?:19|20)\d{2})(?:\s*-\s*((?:19|20)\d{2}))?").unwrap());

#[derive(Debug, Default)]
struct Columns {
    year: Option<usize>,
    make: Option<usize>,
    model: Option<usize>,
    trim: Option<usize>,
    engine: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[String]) -> Option<Self> {
        let mut columns = Self::default();
        for (i, cell) in cells.iter().enumerate() {
            let name = cell.to_lowercase();
            let slot = if name.contains("year") {
                &mut columns.year
            } else if name.contains("make") {
                &mut columns.make
            } else if name.contains("trim") || name.contains("submodel") {
                &mut columns.trim
            } else if name.contains("model") {
                &mut columns.model
            } else if name.contains("engine") {
                &mut columns.engine
            } else {
                continue;
            };
            slot.get_or_insert(i);
        }
        (columns.year.is_some() && columns.model.is_some()).then_some(columns)
    }
}

pub(super) fn expand(page: &ProductPage) -> Option<Vec<FitmentRow>> {
    let manufacturer = page.hints().manufacturer.as_str();
    page.html()
        .select(&TABLE)
        .map(|table| table_rows(table, manufacturer))
        .find(|rows| !rows.is_empty())
}

fn cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL).map(element_text).collect()
}

fn table_rows(table: ElementRef<'_>, manufacturer: &str) -> Vec<FitmentRow> {
    let mut rows = table.select(&ROW);
    let Some(columns) = rows.next().map(cells).as_deref().and_then(Columns::from_header) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in rows {
        if row.value().classes().any(|c| c.contains("hidden")) {
            continue;
        }
        let values = cells(row);
        let get = |col: Option<usize>| {
            col.and_then(|i| values.get(i))
                .map(String::as_str)
                .unwrap_or("")
        };

        let model = get(columns.model);
        if model.is_empty() {
            continue;
        }
        let make = match get(columns.make) {
            "" => manufacturer,
            make => make,
        };
        let trims = split_list(get(columns.trim));
        let engines = split_list(get(columns.engine));

        for year in years_of(get(columns.year)) {
            out.extend(cross_product(&year, make, model, &trims, &engines));
        }
    }
    out
}

fn years_of(cell: &str) -> Vec<String> {
    match YEAR_RANGE.captures(cell) {
        Some(caps) => {
            let from = caps[1].parse().unwrap_or_default();
            let to = caps.get(2).and_then(|m| m.as_str().parse().ok());
            expand_years(from, to)
        }
        None => vec![cell.trim().to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::page::PageHints;

    fn page(markup: &str) -> ProductPage {
        ProductPage::parse("https://www.acurapartswarehouse.com/p.html", markup).with_hints(PageHints {
            manufacturer: "Acura".to_string(),
            ..PageHints::default()
        })
    }

    #[test]
    fn test_table_with_trim_cross_product() {
        let page = page(
            r#"<table class="fitment-table">
                 <tr><th>Year</th><th>Make</th><th>Model</th><th>Trim</th><th>Engine</th></tr>
                 <tr><td>2021</td><td>Acura</td><td>TLX</td><td>Base, A-Spec</td><td>2.0L L4</td></tr>
                 <tr class="fitment-hidden"><td>2022</td><td>Acura</td><td>TLX</td><td></td><td></td></tr>
               </table>"#,
        );
        let rows = expand(&page).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], FitmentRow::new("2021", "Acura", "TLX", "Base", "2.0L L4"));
        assert_eq!(rows[1].trim, "A-Spec");
    }

    #[test]
    fn test_blank_make_defaults_to_manufacturer() {
        let page = page(
            r#"<table>
                 <tr><td>Year</td><td>Model</td></tr>
                 <tr><td>2018-2019</td><td>RDX</td></tr>
               </table>"#,
        );
        let rows = expand(&page).unwrap();
        assert_eq!(
            rows,
            vec![
                FitmentRow::new("2018", "Acura", "RDX", "", ""),
                FitmentRow::new("2019", "Acura", "RDX", "", ""),
            ]
        );
    }

    #[test]
    fn test_unrelated_table_ignored() {
        let page = page(
            r#"<table><tr><th>Weight</th><th>Size</th></tr><tr><td>5 lb</td><td>17in</td></tr></table>"#,
        );
        assert!(expand(&page).is_none());
    }
}
