use indexmap::IndexMap;

use crate::dom::{Document, NodeId};

/// Decode a flat record table: row 0 supplies column headers, every later
/// row zips its cell text against them positionally.
///
/// Rows longer or shorter than the header set zip up to the shorter length —
/// truncation, not padding, to match historic output exactly.
pub fn decode(doc: &Document, table: NodeId) -> Vec<IndexMap<String, String>> {
    let rows = doc.rows(table);
    let Some((&header_row, data_rows)) = rows.split_first() else {
        return Vec::new();
    };

    let headers: Vec<String> = doc.cells(header_row).iter().map(|&c| doc.text(c)).collect();

    data_rows
        .iter()
        .map(|&row| {
            headers
                .iter()
                .zip(doc.cells(row).iter().map(|&c| doc.text(c)))
                .map(|(h, v)| (h.clone(), v))
                .collect()
        })
        .collect()
}

// ── Tests ──
