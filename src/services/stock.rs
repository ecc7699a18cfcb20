//! Stock urgency classification.
//!
//! Computes days-of-stock per product from the latest report snapshots and
//! partitions products into urgent and safe buckets. Pure and recomputed on
//! every request; nothing here touches storage.

use crate::models::{StockEntry, StockLevel, StockReport, StockSnapshot};

/// Days-of-stock at or below this lands a product in the urgent bucket.
pub const URGENT_THRESHOLD_DAYS: f64 = 60.0;

/// Stand-in for "effectively infinite" stock cover when there is inventory
/// but no order velocity. Chosen so such rows sort last in the safe bucket
/// without special-case comparison; it is not a business threshold.
pub const UNBOUNDED_DAYS_SENTINEL: f64 = 999.0;

/// Projected days until stockout. Non-positive order velocity is treated as
/// zero (negative values are out of contract upstream).
pub fn days_of_stock(current_inventory: i64, average_daily_orders: f64) -> f64 {
    if average_daily_orders > 0.0 {
        current_inventory as f64 / average_daily_orders
    } else if current_inventory > 0 {
        UNBOUNDED_DAYS_SENTINEL
    } else {
        0.0
    }
}

/// Classify snapshots into urgent/safe buckets, each sorted ascending by
/// days-of-stock (most urgent first).
pub fn classify_snapshots(snapshots: Vec<StockSnapshot>) -> StockReport {
    let mut urgent = Vec::new();
    let mut safe = Vec::new();

    for snapshot in snapshots {
        let days = days_of_stock(snapshot.current_inventory, snapshot.average_daily_orders);
        let level = if days <= URGENT_THRESHOLD_DAYS {
            StockLevel::Urgent
        } else {
            StockLevel::Safe
        };
        let entry = StockEntry {
            product: snapshot.product,
            brand: snapshot.brand,
            current_inventory: snapshot.current_inventory,
            average_daily_orders: snapshot.average_daily_orders,
            days_of_stock: days,
            level,
        };
        match level {
            StockLevel::Urgent => urgent.push(entry),
            StockLevel::Safe => safe.push(entry),
        }
    }

    urgent.sort_by(|a, b| a.days_of_stock.total_cmp(&b.days_of_stock));
    safe.sort_by(|a, b| a.days_of_stock.total_cmp(&b.days_of_stock));

    StockReport { urgent, safe }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(product: &str, inventory: i64, avg_orders: f64) -> StockSnapshot {
        StockSnapshot {
            product: product.to_string(),
            brand: "Acme".to_string(),
            current_inventory: inventory,
            average_daily_orders: avg_orders,
        }
    }

    #[test]
    fn sixty_days_is_still_urgent() {
        let report = classify_snapshots(vec![snapshot("mug", 120, 2.0)]);
        assert_eq!(report.urgent.len(), 1);
        assert!(report.safe.is_empty());
        assert!((report.urgent[0].days_of_stock - 60.0).abs() < 1e-9);
        assert_eq!(report.urgent[0].level, StockLevel::Urgent);
    }

    #[test]
    fn just_over_sixty_days_is_safe() {
        let report = classify_snapshots(vec![snapshot("mug", 121, 2.0)]);
        assert!(report.urgent.is_empty());
        assert_eq!(report.safe.len(), 1);
        assert!((report.safe[0].days_of_stock - 60.5).abs() < 1e-9);
    }

    #[test]
    fn inventory_without_orders_is_safe_with_sentinel() {
        let report = classify_snapshots(vec![snapshot("mug", 50, 0.0)]);
        assert_eq!(report.safe.len(), 1);
        assert!((report.safe[0].days_of_stock - UNBOUNDED_DAYS_SENTINEL).abs() < 1e-9);
    }

    #[test]
    fn empty_inventory_without_orders_is_urgent_zero() {
        let report = classify_snapshots(vec![snapshot("mug", 0, 0.0)]);
        assert_eq!(report.urgent.len(), 1);
        assert!(report.urgent[0].days_of_stock.abs() < 1e-9);
    }

    #[test]
    fn negative_orders_are_clamped_to_zero_branch() {
        // Out-of-contract input degrades to the zero-orders behavior.
        assert!((days_of_stock(10, -1.5) - UNBOUNDED_DAYS_SENTINEL).abs() < 1e-9);
        assert!(days_of_stock(0, -1.5).abs() < 1e-9);
    }

    #[test]
    fn buckets_are_sorted_ascending() {
        let report = classify_snapshots(vec![
            snapshot("a", 100, 1.0),  // 100 days, safe
            snapshot("b", 10, 1.0),   // 10 days, urgent
            snapshot("c", 50, 0.0),   // sentinel, safe
            snapshot("d", 0, 0.0),    // 0 days, urgent
            snapshot("e", 61, 1.0),   // 61 days, safe
            snapshot("f", 120, 2.0),  // 60 days, urgent
        ]);

        let urgent_days: Vec<f64> = report.urgent.iter().map(|e| e.days_of_stock).collect();
        assert_eq!(urgent_days, vec![0.0, 10.0, 60.0]);

        let safe_days: Vec<f64> = report.safe.iter().map(|e| e.days_of_stock).collect();
        assert_eq!(safe_days, vec![61.0, 100.0, UNBOUNDED_DAYS_SENTINEL]);
        assert_eq!(report.safe.last().map(|e| e.product.as_str()), Some("c"));
    }
}
