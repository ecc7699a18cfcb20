use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};

use crate::db::Database;
use crate::models::BrandDashboard;

/// Monthly revenue/cost/profit figures for one brand, defaulting to the
/// current month, with a trailing 12-month series for charting.
pub fn brand_dashboard(
    db: &Database,
    brand: &str,
    year_month: Option<String>,
) -> Result<BrandDashboard> {
    let now = Local::now();
    let current_year_month =
        year_month.unwrap_or_else(|| format!("{}-{:02}", now.year(), now.month()));

    let revenue_month = db.monthly_settlement_total(brand, &current_year_month)?;
    let costs_month = db.monthly_shipment_cost_total(brand, &current_year_month)?;

    let (chart_months, chart_revenue, chart_costs, chart_profit) =
        build_chart_series(db, brand, &current_year_month)?;

    Ok(BrandDashboard {
        brand: brand.to_string(),
        year_month: current_year_month,
        revenue_month,
        shipment_costs_month: costs_month,
        profit_month: revenue_month - costs_month,
        chart_months,
        chart_revenue,
        chart_costs,
        chart_profit,
    })
}

fn build_chart_series(
    db: &Database,
    brand: &str,
    current_year_month: &str,
) -> Result<(Vec<String>, Vec<f64>, Vec<f64>, Vec<f64>)> {
    let base_date = NaiveDate::parse_from_str(&format!("{}-01", current_year_month), "%Y-%m-%d")
        .map_err(|e| anyhow!("Invalid year-month '{}': {}", current_year_month, e))?;

    let mut months = Vec::new();
    let mut revenue = Vec::new();
    let mut costs = Vec::new();
    let mut profits = Vec::new();

    for offset in (0..12).rev() {
        let date = base_date
            .with_day(1)
            .and_then(|d| d.checked_sub_months(chrono::Months::new(offset as u32)))
            .ok_or_else(|| anyhow!("Invalid date"))?;
        let ym = format!("{}-{:02}", date.year(), date.month());
        let rev = db.monthly_settlement_total(brand, &ym)?;
        let cost = db.monthly_shipment_cost_total(brand, &ym)?;
        months.push(ym);
        revenue.push(rev);
        costs.push(cost);
        profits.push(rev - cost);
    }

    Ok((months, revenue, costs, profits))
}
