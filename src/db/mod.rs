use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::PathBuf;

use crate::models::{
    ProductReport, SettlementTransaction, SettlementUpload, ShipmentCost, StockSnapshot,
    TransactionKind,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: PathBuf) -> SqlResult<Self> {
        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> SqlResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = vec![
            (
                "001_create_settlement_transactions.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_settlement_transactions.sql"
                )),
            ),
            (
                "002_create_product_reports.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_product_reports.sql"
                )),
            ),
            (
                "003_create_shipment_costs.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/003_create_shipment_costs.sql"
                )),
            ),
            (
                "004_create_uploads_and_logs.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/004_create_uploads_and_logs.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    /// Persist one ingestion run: the whole transaction batch plus its upload
    /// bookkeeping row in a single commit, so a partially parsed file never
    /// appears partially persisted.
    pub fn commit_upload(
        &mut self,
        upload: &SettlementUpload,
        records: &[SettlementTransaction],
    ) -> SqlResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO settlement_transactions (
                    id, brand, created_at, order_id, posted_date, kind, marketplace, sku,
                    quantity, principal_amount, shipping_amount, tax_amount, commission_fee,
                    fba_fee, other_fees, total_amount, description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.id,
                    record.brand,
                    record.created_at,
                    record.order_id,
                    record.posted_date,
                    record.kind.as_str(),
                    record.marketplace,
                    record.sku,
                    record.quantity,
                    record.principal_amount,
                    record.shipping_amount,
                    record.tax_amount,
                    record.commission_fee,
                    record.fba_fee,
                    record.other_fees,
                    record.total_amount,
                    record.description,
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO settlement_uploads (id, file_hash, file_path, brand, record_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                upload.id,
                upload.file_hash,
                upload.file_path,
                upload.brand,
                upload.record_count,
                upload.created_at
            ],
        )?;
        tx.commit()
    }

    pub fn find_upload_by_hash(&self, file_hash: &str) -> SqlResult<Option<SettlementUpload>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_hash, file_path, brand, record_count, created_at
             FROM settlement_uploads WHERE file_hash = ?1",
        )?;

        stmt.query_row(params![file_hash], |row| {
            Ok(SettlementUpload {
                id: row.get(0)?,
                file_hash: row.get(1)?,
                file_path: row.get(2)?,
                brand: row.get(3)?,
                record_count: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()
    }

    pub fn log_ingestion(
        &self,
        upload_id: Option<&str>,
        file_hash: Option<&str>,
        brand: &str,
        status: &str,
        message: Option<&str>,
    ) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO ingestion_logs (id, upload_id, file_hash, brand, status, message, created_at)
             VALUES (hex(randomblob(16)), ?1, ?2, ?3, ?4, ?5, datetime('now'))",
            params![upload_id, file_hash, brand, status, message],
        )?;
        Ok(())
    }

    pub fn transactions_for_brand(&self, brand: &str) -> SqlResult<Vec<SettlementTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, brand, created_at, order_id, posted_date, kind, marketplace, sku,
                    quantity, principal_amount, shipping_amount, tax_amount, commission_fee,
                    fba_fee, other_fees, total_amount, description
             FROM settlement_transactions
             WHERE brand = ?1
             ORDER BY posted_date, created_at",
        )?;

        let rows = stmt.query_map(params![brand], map_transaction)?;
        rows.collect()
    }

    pub fn all_transactions(&self) -> SqlResult<Vec<SettlementTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, brand, created_at, order_id, posted_date, kind, marketplace, sku,
                    quantity, principal_amount, shipping_amount, tax_amount, commission_fee,
                    fba_fee, other_fees, total_amount, description
             FROM settlement_transactions
             ORDER BY brand, posted_date, created_at",
        )?;

        let rows = stmt.query_map([], map_transaction)?;
        rows.collect()
    }

    pub fn monthly_settlement_total(&self, brand: &str, year_month: &str) -> SqlResult<f64> {
        let mut stmt = self.conn.prepare(
            "SELECT SUM(total_amount)
             FROM settlement_transactions
             WHERE brand = ?1 AND substr(posted_date, 1, 7) = ?2",
        )?;

        let total: Option<f64> = stmt.query_row(params![brand, year_month], |row| row.get(0))?;
        Ok(total.unwrap_or(0.0))
    }

    pub fn insert_product_report(&self, report: &ProductReport) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO product_reports (id, product, brand, current_inventory, average_daily_orders, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                report.id,
                report.product,
                report.brand,
                report.current_inventory,
                report.average_daily_orders,
                report.created_at
            ],
        )?;
        Ok(())
    }

    /// Latest report row per distinct product name.
    pub fn latest_stock_snapshots(&self) -> SqlResult<Vec<StockSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.product, p.brand, p.current_inventory, p.average_daily_orders
             FROM product_reports p
             JOIN (
                 SELECT product, MAX(created_at) AS max_created
                 FROM product_reports
                 GROUP BY product
             ) m ON m.product = p.product AND p.created_at = m.max_created
             ORDER BY p.product",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(StockSnapshot {
                product: row.get(0)?,
                brand: row.get(1)?,
                current_inventory: row.get(2)?,
                average_daily_orders: row.get(3)?,
            })
        })?;

        rows.collect()
    }

    pub fn insert_shipment_cost(&self, cost: &ShipmentCost) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO shipment_costs (id, brand, cost_date, product, cost_type, total_amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                cost.id,
                cost.brand,
                cost.cost_date,
                cost.product,
                cost.cost_type,
                cost.total_amount,
                cost.created_at
            ],
        )?;
        Ok(())
    }

    pub fn shipment_costs_for_brand(&self, brand: &str) -> SqlResult<Vec<ShipmentCost>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, brand, cost_date, product, cost_type, total_amount, created_at
             FROM shipment_costs
             WHERE brand = ?1
             ORDER BY cost_date, created_at",
        )?;

        let rows = stmt.query_map(params![brand], |row| {
            Ok(ShipmentCost {
                id: row.get(0)?,
                brand: row.get(1)?,
                cost_date: row.get(2)?,
                product: row.get(3)?,
                cost_type: row.get(4)?,
                total_amount: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        rows.collect()
    }

    pub fn monthly_shipment_cost_total(&self, brand: &str, year_month: &str) -> SqlResult<f64> {
        let mut stmt = self.conn.prepare(
            "SELECT SUM(total_amount)
             FROM shipment_costs
             WHERE brand = ?1 AND substr(cost_date, 1, 7) = ?2",
        )?;

        let total: Option<f64> = stmt.query_row(params![brand, year_month], |row| row.get(0))?;
        Ok(total.unwrap_or(0.0))
    }
}

fn map_transaction(row: &Row<'_>) -> SqlResult<SettlementTransaction> {
    let kind: String = row.get(5)?;
    Ok(SettlementTransaction {
        id: row.get(0)?,
        brand: row.get(1)?,
        created_at: row.get(2)?,
        order_id: row.get(3)?,
        posted_date: row.get(4)?,
        kind: TransactionKind::from_str(&kind),
        marketplace: row.get(6)?,
        sku: row.get(7)?,
        quantity: row.get(8)?,
        principal_amount: row.get(9)?,
        shipping_amount: row.get(10)?,
        tax_amount: row.get(11)?,
        commission_fee: row.get(12)?,
        fba_fee: row.get(13)?,
        other_fees: row.get(14)?,
        total_amount: row.get(15)?,
        description: row.get(16)?,
    })
}
