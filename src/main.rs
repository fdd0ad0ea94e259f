mod dom;
mod error;
mod extract;
mod fields;
mod load;
mod pipeline;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::pipeline::ExtractionOutcome;

#[derive(Parser)]
#[command(name = "battery_report", about = "Extract Windows battery reports into JSON datasets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a battery report and write one JSON artifact per section
    Extract {
        /// Path to the battery report HTML document
        #[arg(default_value = "battery-report.html")]
        input: PathBuf,
        /// Directory for the JSON artifacts
        #[arg(short, long, default_value = "data")]
        out_dir: PathBuf,
    },
    /// Summarize previously extracted artifacts
    Show {
        /// Directory holding the JSON artifacts
        #[arg(default_value = "data")]
        out_dir: PathBuf,
        /// Max rows to display per table
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { input, out_dir } => {
            let outcomes = pipeline::extract_file(&input, &out_dir)?;
            let mut written = 0;
            for (kind, outcome) in &outcomes {
                match outcome {
                    ExtractionOutcome::Written { path, records } => {
                        written += 1;
                        println!(
                            "{:<24} {:>5} records -> {}",
                            kind.label(),
                            records,
                            path.display()
                        );
                    }
                    ExtractionOutcome::Skipped(err) => {
                        println!("{:<24} skipped: {}", kind.label(), err);
                    }
                }
            }
            println!("\n{}/{} sections extracted.", written, outcomes.len());
            Ok(())
        }
        Commands::Show { out_dir, limit } => show(&out_dir, limit),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn show(out_dir: &Path, limit: usize) -> anyhow::Result<()> {
    match load::load_key_value(&out_dir.join("battery-report.json")) {
        Ok(summary) => {
            println!("--- Report ---");
            for (k, v) in &summary {
                println!("  {:<28} {}", k, v.replace('\n', " "));
            }
        }
        Err(err) => println!("No report summary: {}", err),
    }

    match load::load_key_value(&out_dir.join("installed-batteries.json")) {
        Ok(battery) => {
            println!("\n--- Battery ---");
            for (k, v) in &battery {
                println!("  {:<28} {}", k, v);
            }
            let capacity = |key: &str| {
                battery
                    .get(key)
                    .and_then(|v| fields::parse_count(v).ok())
                    .map(|n| n.as_f64())
            };
            if let (Some(full), Some(design)) =
                (capacity("FULL CHARGE CAPACITY"), capacity("DESIGN CAPACITY"))
            {
                if design > 0.0 {
                    println!("  {:<28} {:.1} %", "HEALTH", full / design * 100.0);
                }
            }
        }
        Err(err) => println!("\nNo battery details: {}", err),
    }

    match load::load_capacity_history(&out_dir.join("battery-capacity-history.json")) {
        Ok(rows) if !rows.is_empty() => {
            println!("\n--- Capacity history ({} rows) ---", rows.len());
            println!(
                "{:<12} | {:<12} | {:>12} | {:>12}",
                "From", "To", "Full (mWh)", "Design (mWh)"
            );
            println!("{}", "-".repeat(58));
            for r in rows.iter().rev().take(limit) {
                println!(
                    "{:<12} | {:<12} | {:>12} | {:>12}",
                    date_or_dash(r.start_date),
                    date_or_dash(r.end_date),
                    r.full_charge_mwh,
                    r.design_mwh
                );
            }
        }
        Ok(_) => println!("\nCapacity history is empty."),
        Err(err) => println!("\nNo capacity history: {}", err),
    }

    match load::load_life_estimates(&out_dir.join("battery-life-estimates.json")) {
        Ok(rows) if !rows.is_empty() => {
            println!("\n--- Life estimates ({} rows) ---", rows.len());
            println!(
                "{:<12} | {:>14} | {:>14} | {:>14} | {:>14}",
                "From", "Active (full)", "Standby (full)", "Active (dsgn)", "Standby (dsgn)"
            );
            println!("{}", "-".repeat(80));
            for r in rows.iter().rev().take(limit) {
                println!(
                    "{:<12} | {:>14} | {:>14} | {:>14} | {:>14}",
                    date_or_dash(r.start_date),
                    secs_or_dash(r.active_full_secs),
                    secs_or_dash(r.standby_full_secs),
                    secs_or_dash(r.active_design_secs),
                    secs_or_dash(r.standby_design_secs)
                );
            }
        }
        Ok(_) => println!("\nLife estimates are empty."),
        Err(err) => println!("\nNo life estimates: {}", err),
    }

    match load::load_battery_usage(&out_dir.join("battery-usage.json")) {
        Ok(rows) if !rows.is_empty() => {
            println!("\n--- Battery usage ({} rows, latest last) ---", rows.len());
            println!(
                "{:<20} | {:<10} | {:<8} | {:>9} | {:>5} | {:>9}",
                "Start", "State", "Source", "Duration", "%", "mWh"
            );
            println!("{}", "-".repeat(76));
            let start = rows.len().saturating_sub(limit);
            for r in &rows[start..] {
                let start_time = r
                    .start_time
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".into());
                let duration = r
                    .duration
                    .map(|d| format_secs(d.num_seconds()))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:<20} | {:<10} | {:<8} | {:>9} | {:>5} | {:>9}",
                    start_time,
                    truncate(&r.state, 10),
                    truncate(&r.source, 8),
                    duration,
                    r.energy_percent,
                    r.energy_mwh
                );
            }
        }
        Ok(_) => println!("\nBattery usage is empty."),
        Err(err) => println!("\nNo battery usage: {}", err),
    }

    Ok(())
}

fn date_or_dash(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

fn secs_or_dash(secs: Option<i64>) -> String {
    secs.map(format_secs).unwrap_or_else(|| "-".into())
}

fn format_secs(total: i64) -> String {
    format!("{}:{:02}:{:02}", total / 3600, total % 3600 / 60, total % 60)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
