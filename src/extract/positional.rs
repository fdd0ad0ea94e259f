use tracing::debug;

use crate::dom::{Document, NodeId};

/// Decode a header-skip table: headers live at `header_row` (0 for capacity
/// history, 1 for usage history — the skip accounts for a decorative top
/// row), data rows after it are stored positionally as raw cell text.
/// Typing is deferred to the loader stage.
pub fn decode(doc: &Document, table: NodeId, header_row: usize) -> Vec<Vec<String>> {
    let rows = doc.rows(table);
    if rows.len() <= header_row {
        return Vec::new();
    }

    let headers: Vec<String> = doc
        .cells(rows[header_row])
        .iter()
        .map(|&c| doc.text(c))
        .collect();
    debug!(?headers, "positional table headers");

    rows[header_row + 1..]
        .iter()
        .map(|&row| doc.cells(row).iter().map(|&c| doc.text(c)).collect())
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HeadingLevel;

    const USAGE_HISTORY: &str = "<h2>Usage history</h2><table>\
        <tr><td></td><td colspan=\"2\">BATTERY DURATION</td></tr>\
        <tr><td>PERIOD</td><td>ACTIVE</td><td>CONNECTED STANDBY</td></tr>\
        <tr><td>2024-04-21 - 2024-04-28</td><td>10:02:22</td><td>0:41:38</td></tr>\
        <tr><td>2024-04-28 - 2024-05-05</td><td>26:15:10</td><td>-</td></tr>\
        </table>";

    #[test]
    fn skips_decorative_row_and_header_row() {
        let doc = Document::parse(USAGE_HISTORY).unwrap();
        let h = doc.find_heading(HeadingLevel::H2, "Usage history").unwrap();
        let rows = decode(&doc, doc.next_table(h).unwrap(), 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["2024-04-21 - 2024-04-28", "10:02:22", "0:41:38"]);
        assert_eq!(rows[1][2], "-");
    }

    #[test]
    fn header_row_zero_keeps_all_data_rows() {
        let html = "<h2>Battery capacity history</h2><table>\
            <tr><td>PERIOD</td><td>FULL CHARGE CAPACITY</td><td>DESIGN CAPACITY</td></tr>\
            <tr><td>2024-05-05</td><td>45,000 mWh</td><td>50,000 mWh</td></tr>\
            </table>";
        let doc = Document::parse(html).unwrap();
        let h = doc
            .find_heading(HeadingLevel::H2, "Battery capacity history")
            .unwrap();
        let rows = decode(&doc, doc.next_table(h).unwrap(), 0);
        assert_eq!(rows, vec![vec!["2024-05-05", "45,000 mWh", "50,000 mWh"]]);
    }

    #[test]
    fn table_with_only_headers_is_empty() {
        let html = "<h2>Usage history</h2><table>\
            <tr><td>deco</td></tr><tr><td>PERIOD</td></tr></table>";
        let doc = Document::parse(html).unwrap();
        let h = doc.find_heading(HeadingLevel::H2, "Usage history").unwrap();
        assert!(decode(&doc, doc.next_table(h).unwrap(), 1).is_empty());
    }
}
