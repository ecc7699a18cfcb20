use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a settlement transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Order,
    OtherTransaction,
    Advertising,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Order => "Order",
            TransactionKind::OtherTransaction => "OtherTransaction",
            TransactionKind::Advertising => "Advertising",
        }
    }

    /// Lenient decode for values coming back from storage.
    pub fn from_str(value: &str) -> Self {
        match value {
            "Order" => TransactionKind::Order,
            "Advertising" => TransactionKind::Advertising,
            _ => TransactionKind::OtherTransaction,
        }
    }
}

/// One monetized settlement event tied to a brand. Rows are written in bulk
/// during an ingestion run and never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementTransaction {
    pub id: String,
    pub brand: String,
    pub created_at: DateTime<Utc>,
    pub order_id: Option<String>,
    pub posted_date: Option<NaiveDateTime>,
    pub kind: TransactionKind,
    pub marketplace: Option<String>,
    pub sku: Option<String>,
    pub quantity: i64,
    pub principal_amount: f64,
    pub shipping_amount: f64,
    pub tax_amount: f64,
    pub commission_fee: f64,
    pub fba_fee: f64,
    pub other_fees: f64,
    pub total_amount: f64,
    /// Transaction-type label for non-order kinds.
    pub description: Option<String>,
}

/// Per-product inventory report row as submitted by employees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReport {
    pub id: String,
    pub product: String,
    pub brand: String,
    pub current_inventory: i64,
    pub average_daily_orders: f64,
    pub created_at: DateTime<Utc>,
}

/// The most recent report row for a product, as returned by the
/// latest-per-product storage query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub product: String,
    pub brand: String,
    pub current_inventory: i64,
    pub average_daily_orders: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLevel {
    Urgent,
    Safe,
}

/// A classified snapshot with its computed days-of-stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub product: String,
    pub brand: String,
    pub current_inventory: i64,
    pub average_daily_orders: f64,
    pub days_of_stock: f64,
    pub level: StockLevel,
}

/// Urgency report, recomputed on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReport {
    pub urgent: Vec<StockEntry>,
    pub safe: Vec<StockEntry>,
}

/// Manually logged shipment/order cost entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCost {
    pub id: String,
    pub brand: String,
    pub cost_date: NaiveDate,
    pub product: String,
    pub cost_type: String,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Bookkeeping row for one ingested settlement file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementUpload {
    pub id: String,
    pub file_hash: String,
    pub file_path: Option<String>,
    pub brand: String,
    pub record_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Monthly revenue/cost figures for one brand, plus a trailing series for
/// charting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandDashboard {
    pub brand: String,
    pub year_month: String,
    pub revenue_month: f64,
    pub shipment_costs_month: f64,
    pub profit_month: f64,
    pub chart_months: Vec<String>,
    pub chart_revenue: Vec<f64>,
    pub chart_costs: Vec<f64>,
    pub chart_profit: Vec<f64>,
}
