use indexmap::IndexMap;

use crate::dom::{Document, NodeId};

/// Decode a label/value table (report summary, installed batteries).
///
/// Each row contributes one entry: the label comes from the cell marked with
/// the `label` class (a `td` in the summary table, a `span` in the batteries
/// table), the value from the next `td` after it. Rows without a recognized
/// label cell are skipped. Duplicate labels resolve last-write-wins.
pub fn decode(doc: &Document, table: NodeId) -> IndexMap<String, String> {
    let mut details = IndexMap::new();

    for row in doc.rows(table) {
        let Some(label) = doc.label_cell(row) else {
            continue;
        };
        let Some(value) = doc.next_td_after(row, label) else {
            continue;
        };
        details.insert(doc.text(label), doc.text(value));
    }

    details
}

// ── Tests ──
