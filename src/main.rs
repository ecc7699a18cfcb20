use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use brandpulse::commands;
use brandpulse::config::Config;
use brandpulse::db::Database;
use brandpulse::services::processor;

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.data_dir)?;
    let mut db = Database::new(config.database_path())?;

    scan_settlements(&mut db, &config)?;
    print_stock_report(&db)?;

    Ok(())
}

/// Walk the drop folder (one subfolder per brand) and ingest every
/// settlement file found. Failures are logged per file; the scan continues.
fn scan_settlements(db: &mut Database, config: &Config) -> Result<()> {
    if !config.settlement_dir.exists() {
        info!(dir = %config.settlement_dir.display(), "no settlement folder, skipping scan");
        return Ok(());
    }

    let brand_dirs = walkdir::WalkDir::new(&config.settlement_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect::<Vec<_>>();

    for brand_dir in brand_dirs {
        let brand = brand_dir.file_name().to_string_lossy().to_string();
        let files = walkdir::WalkDir::new(brand_dir.path())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| is_xml(e.path()))
            .collect::<Vec<_>>();

        for entry in files {
            match processor::process_settlement_file(db, entry.path(), &brand) {
                Ok(outcome) if outcome.skipped => {}
                Ok(outcome) => {
                    info!(%brand, count = outcome.record_count, "ingested settlement file");
                }
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "skipping settlement file");
                }
            }
        }
    }

    Ok(())
}

fn print_stock_report(db: &Database) -> Result<()> {
    let report = commands::stock::stock_report(db)?;

    println!(
        "Stock urgency report: {} urgent, {} safe",
        report.urgent.len(),
        report.safe.len()
    );
    for entry in &report.urgent {
        println!(
            "  URGENT  {:<30} {:>6} units  {:>7.1} days left",
            entry.product, entry.current_inventory, entry.days_of_stock
        );
    }
    for entry in &report.safe {
        println!(
            "  safe    {:<30} {:>6} units  {:>7.1} days left",
            entry.product, entry.current_inventory, entry.days_of_stock
        );
    }

    Ok(())
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}
