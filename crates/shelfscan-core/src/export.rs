//! # Selection Export
//!
//! Renders the products ticked in the shelf view as CSV text. Writing the
//! file (or offering it as a download) is left to the caller.

use crate::types::SelectedProduct;

/// Header row of the export.
pub const EXPORT_HEADER: [&str; 3] = ["shelf_id", "jan", "productName"];

/// Renders `items` as CRLF-separated CSV, or `None` if nothing is selected.
pub fn selection_csv(items: &[SelectedProduct]) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(EXPORT_HEADER.join(","));
    for item in items {
        lines.push(
            [
                item.shelf_id.as_str(),
                item.jan.as_str(),
                item.product_name.as_deref().unwrap_or(""),
            ]
            .join(","),
        );
    }
    Some(lines.join("\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_csv() {
        let items = vec![
            SelectedProduct {
                shelf_id: "S01_1F_12".into(),
                jan: "4006381333931".into(),
                product_name: Some("Notebook".into()),
            },
            SelectedProduct {
                shelf_id: "S01_1F_13".into(),
                jan: "96385074".into(),
                product_name: None,
            },
        ];

        let csv = selection_csv(&items).unwrap();
        assert_eq!(
            csv,
            "shelf_id,jan,productName\r\nS01_1F_12,4006381333931,Notebook\r\nS01_1F_13,96385074,"
        );
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(selection_csv(&[]), None);
    }
}
