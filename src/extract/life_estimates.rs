use tracing::debug;

use crate::dom::{Document, NodeId};

// Cell positions in a life-estimates data row. The two connected-standby
// cells may carry a nested drain element alongside the time.
const PERIOD: usize = 0;
const ACTIVE_FULL: usize = 1;
const STANDBY_FULL: usize = 2;
const ACTIVE_DESIGN: usize = 3;
const STANDBY_DESIGN: usize = 4;

/// Decode the battery-life-estimates table. Headers sit in row 1 (row 0 is
/// decorative group labels); data rows yield seven entries:
///
/// `[period, active_fc, standby_fc, fc_drain, active_dc, standby_dc, dc_drain]`
///
/// The drain sub-values come from a nested `percent` element inside the two
/// standby cells, empty when absent. The period is emitted as a single
/// string; splitting it is the loader's job.
pub fn decode(doc: &Document, table: NodeId) -> Vec<Vec<String>> {
    let rows = doc.rows(table);
    if rows.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = doc
        .cells(rows[1])
        .iter()
        .map(|&c| doc.text(c).replace('\u{a0}', " ").trim().to_string())
        .filter(|h| !h.is_empty())
        .collect();
    debug!(?headers, "life estimates headers");

    rows[2..]
        .iter()
        .map(|&row| {
            let cells = doc.cells(row);
            let text = |i: usize| cells.get(i).map(|&c| doc.text(c)).unwrap_or_default();
            let drain = |i: usize| {
                cells
                    .get(i)
                    .and_then(|&c| doc.descendant_with_class(c, "percent"))
                    .map(|n| doc.text(n))
                    .unwrap_or_default()
            };
            vec![
                text(PERIOD),
                text(ACTIVE_FULL),
                text(STANDBY_FULL),
                drain(STANDBY_FULL),
                text(ACTIVE_DESIGN),
                text(STANDBY_DESIGN),
                drain(STANDBY_DESIGN),
            ]
        })
        .collect()
}

// ── Tests ──
