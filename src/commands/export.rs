use anyhow::Result;
use std::io::Write;

use crate::db::Database;
use crate::utils::{format_decimal, format_display_date, format_display_datetime};

/// Dump all settlement transactions as CSV. Display formatting (dd/mm/yyyy
/// dates, two-decimal amounts) is applied here and nowhere else.
pub fn export_transactions_csv<W: Write>(db: &Database, writer: W) -> Result<()> {
    let transactions = db.all_transactions()?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "brand",
        "created_at",
        "order_id",
        "posted_date",
        "kind",
        "marketplace",
        "sku",
        "quantity",
        "principal_amount",
        "shipping_amount",
        "tax_amount",
        "commission_fee",
        "fba_fee",
        "other_fees",
        "total_amount",
        "description",
    ])?;

    for tx in &transactions {
        csv_writer.write_record([
            tx.brand.clone(),
            format_display_datetime(&tx.created_at.naive_utc()),
            tx.order_id.clone().unwrap_or_default(),
            tx.posted_date
                .as_ref()
                .map(format_display_datetime)
                .unwrap_or_default(),
            tx.kind.as_str().to_string(),
            tx.marketplace.clone().unwrap_or_default(),
            tx.sku.clone().unwrap_or_default(),
            tx.quantity.to_string(),
            format_decimal(tx.principal_amount),
            format_decimal(tx.shipping_amount),
            format_decimal(tx.tax_amount),
            format_decimal(tx.commission_fee),
            format_decimal(tx.fba_fee),
            format_decimal(tx.other_fees),
            format_decimal(tx.total_amount),
            tx.description.clone().unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Dump one brand's shipment cost log as CSV, ordered by cost date then
/// entry time.
pub fn export_shipment_costs_csv<W: Write>(db: &Database, brand: &str, writer: W) -> Result<()> {
    let costs = db.shipment_costs_for_brand(brand)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "brand",
        "cost_date",
        "product",
        "cost_type",
        "total_amount",
        "created_at",
    ])?;

    for cost in &costs {
        csv_writer.write_record([
            cost.brand.clone(),
            format_display_date(&cost.cost_date),
            cost.product.clone(),
            cost.cost_type.clone(),
            format_decimal(cost.total_amount),
            format_display_datetime(&cost.created_at.naive_utc()),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
