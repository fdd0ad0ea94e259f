pub mod battery_usage;
pub mod flat;
pub mod key_value;
pub mod life_estimates;
pub mod positional;

use indexmap::IndexMap;
use serde::Serialize;

use crate::dom::{Document, HeadingLevel, NodeId};
use crate::error::ExtractError;

/// The closed set of report sections, in the fixed extraction order. Each
/// kind maps to exactly one decoder and one artifact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    BatteryReportSummary,
    InstalledBatteries,
    RecentUsage,
    BatteryUsage,
    UsageHistory,
    CapacityHistory,
    LifeEstimates,
}

/// How to find a section: heading level plus a required substring of the
/// heading text (case-sensitive).
pub struct SectionQuery {
    pub level: HeadingLevel,
    pub contains: &'static str,
}

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        SectionKind::BatteryReportSummary,
        SectionKind::InstalledBatteries,
        SectionKind::RecentUsage,
        SectionKind::BatteryUsage,
        SectionKind::UsageHistory,
        SectionKind::CapacityHistory,
        SectionKind::LifeEstimates,
    ];

    pub fn query(self) -> SectionQuery {
        let (level, contains) = match self {
            SectionKind::BatteryReportSummary => (HeadingLevel::H1, "Battery report"),
            SectionKind::InstalledBatteries => (HeadingLevel::H2, "Installed batteries"),
            SectionKind::RecentUsage => (HeadingLevel::H2, "Recent usage"),
            SectionKind::BatteryUsage => (HeadingLevel::H2, "Battery usage"),
            SectionKind::UsageHistory => (HeadingLevel::H2, "Usage history"),
            SectionKind::CapacityHistory => (HeadingLevel::H2, "Battery capacity history"),
            SectionKind::LifeEstimates => (HeadingLevel::H2, "Battery life estimates"),
        };
        SectionQuery { level, contains }
    }

    /// Artifact file name, stable across runs.
    pub fn artifact_name(self) -> &'static str {
        match self {
            SectionKind::BatteryReportSummary => "battery-report.json",
            SectionKind::InstalledBatteries => "installed-batteries.json",
            SectionKind::RecentUsage => "recent-usage.json",
            SectionKind::BatteryUsage => "battery-usage.json",
            SectionKind::UsageHistory => "usage-history.json",
            SectionKind::CapacityHistory => "battery-capacity-history.json",
            SectionKind::LifeEstimates => "battery-life-estimates.json",
        }
    }

    pub fn label(self) -> &'static str {
        self.query().contains
    }
}

/// Decoder output. Within one extraction every record of a section shares
/// one variant; the untagged serialization matches the artifact shapes the
/// downstream loaders expect (object / array of objects / array of arrays).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SectionData {
    /// One mapping for the whole section (summary sections).
    KeyValue(IndexMap<String, String>),
    /// One column-name → text record per row, document order preserved.
    Records(Vec<IndexMap<String, String>>),
    /// Raw positional rows; typing is deferred to the loaders.
    Rows(Vec<Vec<String>>),
}

impl SectionData {
    pub fn len(&self) -> usize {
        match self {
            SectionData::KeyValue(map) => map.len(),
            SectionData::Records(records) => records.len(),
            SectionData::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Locate a section's table: the matching heading, then the first table
/// after it. Either miss is `SectionNotFound` — recoverable, not fatal.
pub fn locate(doc: &Document, kind: SectionKind) -> Result<NodeId, ExtractError> {
    let query = kind.query();
    let heading = doc
        .find_heading(query.level, query.contains)
        .ok_or(ExtractError::SectionNotFound(query.contains))?;
    doc.next_table(heading)
        .ok_or(ExtractError::SectionNotFound(query.contains))
}

/// Decode a located table with the decoder for its section kind. Decoders
/// are total: malformed rows are skipped or defaulted, never fatal.
pub fn decode(doc: &Document, table: NodeId, kind: SectionKind) -> SectionData {
    match kind {
        SectionKind::BatteryReportSummary | SectionKind::InstalledBatteries => {
            SectionData::KeyValue(key_value::decode(doc, table))
        }
        SectionKind::RecentUsage => SectionData::Records(flat::decode(doc, table)),
        SectionKind::BatteryUsage => SectionData::Records(battery_usage::decode(doc, table)),
        SectionKind::UsageHistory => SectionData::Rows(positional::decode(doc, table, 1)),
        SectionKind::CapacityHistory => SectionData::Rows(positional::decode(doc, table, 0)),
        SectionKind::LifeEstimates => SectionData::Rows(life_estimates::decode(doc, table)),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_reports_missing_heading() {
        let doc = Document::parse("<body><h2>Something else</h2><table></table></body>").unwrap();
        let err = locate(&doc, SectionKind::LifeEstimates).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::SectionNotFound("Battery life estimates")
        ));
    }

    #[test]
    fn locate_reports_missing_table() {
        let doc = Document::parse("<body><h2>Usage history</h2><p>tail</p></body>").unwrap();
        assert!(matches!(
            locate(&doc, SectionKind::UsageHistory),
            Err(ExtractError::SectionNotFound(_))
        ));
    }

    #[test]
    fn artifact_names_are_stable() {
        let names: Vec<_> = SectionKind::ALL.iter().map(|k| k.artifact_name()).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"battery-capacity-history.json"));
        // One file per kind, no collisions.
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }
}
