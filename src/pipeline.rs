use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::dom::Document;
use crate::error::ExtractError;
use crate::extract::{self, SectionData, SectionKind};

/// Per-section result of one extraction run. Partial data is the expected
/// common case, so outcomes are reported per section rather than as a single
/// pass/fail flag.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Written { path: PathBuf, records: usize },
    Skipped(ExtractError),
}

impl ExtractionOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, ExtractionOutcome::Written { .. })
    }
}

/// Run every section extraction against one document and write an artifact
/// per completed section.
///
/// Only an unparseable document or an unusable output directory is fatal;
/// each section otherwise fails independently. Sections are extracted in
/// parallel — safe because they share the immutable document and own
/// distinct artifact paths, with the directory created once up front.
pub fn extract_report(
    html: &str,
    out_dir: &Path,
) -> Result<BTreeMap<SectionKind, ExtractionOutcome>, ExtractError> {
    let doc = Document::parse(html)?;
    fs::create_dir_all(out_dir).map_err(|e| ExtractError::io(out_dir, e))?;

    let outcomes: BTreeMap<SectionKind, ExtractionOutcome> = SectionKind::ALL
        .par_iter()
        .map(|&kind| (kind, extract_section(&doc, kind, out_dir)))
        .collect();

    let written = outcomes.values().filter(|o| o.is_written()).count();
    info!(
        "Extracted {}/{} sections into {}",
        written,
        SectionKind::ALL.len(),
        out_dir.display()
    );
    Ok(outcomes)
}

/// Read the input document, then run `extract_report`. An unreadable input
/// is fatal to the whole run.
pub fn extract_file(
    input: &Path,
    out_dir: &Path,
) -> Result<BTreeMap<SectionKind, ExtractionOutcome>, ExtractError> {
    let html = fs::read_to_string(input).map_err(|e| ExtractError::io(input, e))?;
    extract_report(&html, out_dir)
}

fn extract_section(doc: &Document, kind: SectionKind, out_dir: &Path) -> ExtractionOutcome {
    let table = match extract::locate(doc, kind) {
        Ok(table) => table,
        Err(err) => {
            warn!("{}: {}", kind.label(), err);
            return ExtractionOutcome::Skipped(err);
        }
    };

    let data = extract::decode(doc, table, kind);
    match write_artifact(out_dir, kind, &data) {
        Ok(path) => {
            info!("{}: {} records -> {}", kind.label(), data.len(), path.display());
            ExtractionOutcome::Written {
                path,
                records: data.len(),
            }
        }
        Err(err) => {
            warn!("{}: {}", kind.label(), err);
            ExtractionOutcome::Skipped(err)
        }
    }
}

/// Serialize fully before touching the file, so a failed serialization never
/// leaves a partial artifact. Re-runs overwrite unconditionally.
fn write_artifact(
    out_dir: &Path,
    kind: SectionKind,
    data: &SectionData,
) -> Result<PathBuf, ExtractError> {
    let path = out_dir.join(kind.artifact_name());
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&path, json).map_err(|e| ExtractError::io(&path, e))?;
    Ok(path)
}

// ── Tests ──
