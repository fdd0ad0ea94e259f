use indexmap::IndexMap;

use crate::dom::{Document, NodeId};
use crate::fields;

/// Appended when a data row comes up exactly one field short of the header
/// set. Removing this would silently drop otherwise-valid rows, so it is a
/// stable contract.
const DEFAULT_ENERGY: &str = "0 mWh";

/// Decode the battery-usage table: a flat record table with extra per-cell
/// handling.
///
/// Column 0 carries a date only on the first row of a contiguous run; the
/// last non-empty date sticks and is combined with each row's time sub-field
/// into a full timestamp string. The designated percentage column is
/// truncated to its leading `N %` token. Rows made of a single spanning cell
/// are day dividers and are skipped.
pub fn decode(doc: &Document, table: NodeId) -> Vec<IndexMap<String, String>> {
    let rows = doc.rows(table);
    let Some((&header_row, data_rows)) = rows.split_first() else {
        return Vec::new();
    };

    let headers: Vec<String> = doc.cells(header_row).iter().map(|&c| doc.text(c)).collect();
    let percent_col = headers.iter().position(|h| h.contains('%'));

    let mut carried_date = String::new();
    let mut records = Vec::new();

    for &row in data_rows {
        let cells = doc.cells(row);
        if cells.len() <= 1 {
            // Single spanning cell: a section sub-divider, not a record.
            continue;
        }

        let mut texts: Vec<String> = cells.iter().map(|&c| doc.text(c)).collect();

        if let Some(first) = texts.first_mut() {
            let time = match first.split_once('\n') {
                Some((date, time)) => {
                    carried_date = date.trim().to_string();
                    time.trim().to_string()
                }
                None => first.trim().to_string(),
            };
            *first = if carried_date.is_empty() {
                time
            } else {
                format!("{} {}", carried_date, time)
            };
        }

        if let Some(i) = percent_col {
            if let Some(cell) = texts.get_mut(i) {
                if let Some(token) = fields::percent_extract(cell) {
                    *cell = token;
                }
            }
        }

        if texts.len() + 1 == headers.len() {
            texts.push(DEFAULT_ENERGY.to_string());
        }

        records.push(headers.iter().cloned().zip(texts).collect());
    }

    records
}

// ── Tests ──
