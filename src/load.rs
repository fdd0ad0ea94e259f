use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ExtractError;
use crate::fields;

/// A normalized capacity-history row: period split into dates, capacities as
/// plain mWh numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityHistoryRow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub full_charge_mwh: f64,
    pub design_mwh: f64,
}

/// A normalized life-estimates row. Durations are seconds; absent or
/// unparseable durations stay missing, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LifeEstimateRow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub active_full_secs: Option<i64>,
    pub standby_full_secs: Option<i64>,
    pub active_design_secs: Option<i64>,
    pub standby_design_secs: Option<i64>,
    pub standby_full_percent: Option<i64>,
    pub standby_design_percent: Option<i64>,
}

/// A normalized battery-usage row. Only the two energy columns zero-fill;
/// timestamp and duration stay missing when unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryUsageRow {
    pub start_time: Option<NaiveDateTime>,
    pub state: String,
    pub source: String,
    pub duration: Option<TimeDelta>,
    pub energy_percent: f64,
    pub energy_mwh: f64,
}

/// Read a key/value artifact (report summary, installed batteries) back as
/// an ordered mapping.
pub fn load_key_value(path: &Path) -> Result<IndexMap<String, String>, ExtractError> {
    read_json(path)
}

/// Materialize the capacity-history artifact. Rows whose capacity cells do
/// not parse are skipped; unparseable dates load as missing.
pub fn load_capacity_history(path: &Path) -> Result<Vec<CapacityHistoryRow>, ExtractError> {
    let rows: Vec<Vec<String>> = read_json(path)?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            if row.len() < 3 {
                warn!(?row, "capacity history row too short, skipping");
                return None;
            }
            let (start, end) = fields::parse_date_range(&row[0]);
            let full = fields::parse_count(&row[1]).ok()?.as_f64();
            let design = fields::parse_count(&row[2]).ok()?.as_f64();
            Some(CapacityHistoryRow {
                start_date: fields::parse_date(&start).ok(),
                end_date: fields::parse_date(&end).ok(),
                full_charge_mwh: full,
                design_mwh: design,
            })
        })
        .collect())
}

/// Materialize the life-estimates artifact from its seven-entry positional
/// rows: period split into dates, clock tokens decoded to seconds, percent
/// tokens from the two standby columns.
pub fn load_life_estimates(path: &Path) -> Result<Vec<LifeEstimateRow>, ExtractError> {
    let rows: Vec<Vec<String>> = read_json(path)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
            let (start, end) = fields::parse_date_range(cell(0));
            LifeEstimateRow {
                start_date: fields::parse_date(&start).ok(),
                end_date: fields::parse_date(&end).ok(),
                active_full_secs: clock_secs(cell(1)),
                standby_full_secs: clock_secs(cell(2)),
                active_design_secs: clock_secs(cell(4)),
                standby_design_secs: clock_secs(cell(5)),
                standby_full_percent: percent_value(cell(2)),
                standby_design_percent: percent_value(cell(5)),
            }
        })
        .collect())
}

/// Materialize the battery-usage artifact. Columns are matched by header
/// name (case-insensitive substring); the first column is the timestamp.
pub fn load_battery_usage(path: &Path) -> Result<Vec<BatteryUsageRow>, ExtractError> {
    let records: Vec<IndexMap<String, String>> = read_json(path)?;

    Ok(records
        .into_iter()
        .map(|rec| {
            let col = |needle: &str| {
                rec.iter()
                    .find(|(k, _)| k.to_lowercase().contains(&needle.to_lowercase()))
                    .map(|(_, v)| v.as_str())
            };

            let start_time = rec
                .values()
                .next()
                .and_then(|v| fields::parse_datetime(v).ok());
            let energy = |needle: &str| {
                col(needle)
                    .and_then(|v| fields::parse_count(v).ok())
                    .map(fields::Number::as_f64)
                    .unwrap_or(0.0)
            };

            BatteryUsageRow {
                start_time,
                state: col("state").unwrap_or_default().to_string(),
                source: col("source").unwrap_or_default().to_string(),
                duration: col("duration").and_then(|v| fields::parse_duration(v).ok().flatten()),
                energy_percent: energy("%"),
                energy_mwh: energy("mwh"),
            }
        })
        .collect())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ExtractError> {
    let raw = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
    Ok(serde_json::from_str(&raw)?)
}

/// First clock token in the cell, decoded to seconds; missing on absence.
fn clock_secs(text: &str) -> Option<i64> {
    fields::clock_extract(text).and_then(|t| fields::parse_clock_duration(&t).ok().flatten())
}

/// First percent token in the cell, as its integer value.
fn percent_value(text: &str) -> Option<i64> {
    fields::percent_extract(text).and_then(|t| t.split_whitespace().next()?.parse().ok())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn artifact(json: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.json");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(json.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn capacity_history_splits_period_and_strips_units() {
        let (_dir, path) = artifact(
            r#"[["2024-04-21\n2024-04-28","46,800 mWh","50,000 mWh"],
                ["2024-05-05","45,000 mWh","50,000 mWh"]]"#,
        );
        let rows = load_capacity_history(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].start_date,
            NaiveDate::from_ymd_opt(2024, 4, 21)
        );
        assert_eq!(rows[0].end_date, NaiveDate::from_ymd_opt(2024, 4, 28));
        assert_eq!(rows[0].full_charge_mwh, 46800.0);
        assert_eq!(rows[0].design_mwh, 50000.0);
        // Single-line period: end date missing, not defaulted.
        assert_eq!(rows[1].end_date, None);
    }

    #[test]
    fn capacity_history_skips_rows_with_bad_numbers() {
        let (_dir, path) = artifact(
            r#"[["2024-05-05","junk","50,000 mWh"],
                ["2024-05-12","44,900 mWh","50,000 mWh"]]"#,
        );
        let rows = load_capacity_history(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].full_charge_mwh, 44900.0);
    }

    #[test]
    fn life_estimates_decode_durations_and_percents() {
        let (_dir, path) = artifact(
            r#"[["2024-04-21\n2024-04-28","6:02:03","10:52:59\n8 %","8 %","6:32:55","11:51:10\n9 %","9 %"]]"#,
        );
        let rows = load_life_estimates(&path).unwrap();
        let r = &rows[0];
        assert_eq!(r.active_full_secs, Some(6 * 3600 + 2 * 60 + 3));
        assert_eq!(r.standby_full_secs, Some(10 * 3600 + 52 * 60 + 59));
        assert_eq!(r.standby_full_percent, Some(8));
        assert_eq!(r.standby_design_percent, Some(9));
        assert_eq!(r.start_date, NaiveDate::from_ymd_opt(2024, 4, 21));
    }

    #[test]
    fn life_estimates_missing_duration_stays_missing() {
        let (_dir, path) =
            artifact(r#"[["2024-05-05","-","no clock here","","6:32:55","",""]]"#);
        let rows = load_life_estimates(&path).unwrap();
        let r = &rows[0];
        assert_eq!(r.active_full_secs, None);
        assert_eq!(r.standby_full_secs, None);
        assert_eq!(r.standby_design_secs, None);
        assert_eq!(r.active_design_secs, Some(6 * 3600 + 32 * 60 + 55));
        assert_eq!(r.standby_full_percent, None);
    }

    #[test]
    fn life_estimates_overflowing_clock_loads_as_missing() {
        let (_dir, path) = artifact(
            r#"[["2024-05-05","99999999999999999999:00:00","","","6:32:55","",""]]"#,
        );
        let rows = load_life_estimates(&path).unwrap();
        assert_eq!(rows[0].active_full_secs, None);
        assert_eq!(rows[0].active_design_secs, Some(6 * 3600 + 32 * 60 + 55));
    }

    #[test]
    fn battery_usage_zero_fills_only_energy_columns() {
        let (_dir, path) = artifact(
            r#"[{"START TIME":"2024-05-11 07:13:05","STATE":"Suspended","SOURCE":"Battery",
                 "DURATION":"0:46:55","ENERGY DRAINED (%)":"1 %","ENERGY DRAINED (mWh)":"0 mWh"},
                {"START TIME":"not a time","STATE":"Active","SOURCE":"AC",
                 "DURATION":"-","ENERGY DRAINED (%)":"-","ENERGY DRAINED (mWh)":"-"}]"#,
        );
        let rows = load_battery_usage(&path).unwrap();
        assert_eq!(rows[0].duration, Some(TimeDelta::seconds(46 * 60 + 55)));
        assert_eq!(rows[0].energy_percent, 1.0);
        assert_eq!(rows[0].energy_mwh, 0.0);
        assert!(rows[0].start_time.is_some());

        // Energy columns zero-fill; timestamp and duration stay missing.
        assert_eq!(rows[1].energy_percent, 0.0);
        assert_eq!(rows[1].energy_mwh, 0.0);
        assert_eq!(rows[1].start_time, None);
        assert_eq!(rows[1].duration, None);
    }

    #[test]
    fn missing_artifact_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_key_value(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn wrong_shape_is_artifact_error() {
        let (_dir, path) = artifact(r#"{"not":"an array"}"#);
        assert!(matches!(
            load_capacity_history(&path),
            Err(ExtractError::Artifact(_))
        ));
    }
}
