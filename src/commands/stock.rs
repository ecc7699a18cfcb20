use anyhow::Result;

use crate::db::Database;
use crate::models::StockReport;
use crate::services::stock;

/// Current stock urgency report: latest snapshot per product, classified and
/// sorted. Recomputed on every call.
pub fn stock_report(db: &Database) -> Result<StockReport> {
    let snapshots = db.latest_stock_snapshots()?;
    Ok(stock::classify_snapshots(snapshots))
}
