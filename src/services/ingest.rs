//! Amazon settlement XML ingestion.
//!
//! Flattens the nested settlement envelope (settlement report -> orders ->
//! fulfillments -> items -> price/fee components) into storage-ready
//! [`SettlementTransaction`] rows. The brand is supplied by the caller and
//! never read from the document. Persistence is the caller's responsibility.

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::models::{SettlementTransaction, TransactionKind};
use crate::utils::{now_utc, parse_posted_date};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("settlement document could not be parsed: {0}")]
    MalformedDocument(String),
}

// Settlement envelope structure. Unknown elements (SettlementData headers,
// currency attributes and so on) are skipped by serde.

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Message", default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(rename = "SettlementReport")]
    settlement_report: Option<SettlementReport>,
}

#[derive(Debug, Deserialize)]
struct SettlementReport {
    #[serde(rename = "Order", default)]
    orders: Vec<OrderNode>,
    #[serde(rename = "OtherTransaction", default)]
    other_transactions: Vec<OtherTransactionNode>,
    #[serde(rename = "AdvertisingTransactionDetails", default)]
    advertising: Vec<AdvertisingNode>,
}

#[derive(Debug, Deserialize)]
struct OrderNode {
    #[serde(rename = "AmazonOrderID")]
    order_id: Option<String>,
    #[serde(rename = "MarketplaceName")]
    marketplace: Option<String>,
    #[serde(rename = "Fulfillment", default)]
    fulfillments: Vec<FulfillmentNode>,
}

#[derive(Debug, Deserialize)]
struct FulfillmentNode {
    #[serde(rename = "PostedDate")]
    posted_date: Option<String>,
    #[serde(rename = "Item", default)]
    items: Vec<ItemNode>,
}

#[derive(Debug, Deserialize)]
struct ItemNode {
    #[serde(rename = "SKU")]
    sku: Option<String>,
    #[serde(rename = "Quantity")]
    quantity: Option<String>,
    #[serde(rename = "ItemPrice")]
    item_price: Option<ComponentList>,
    #[serde(rename = "ItemFees")]
    item_fees: Option<FeeList>,
}

#[derive(Debug, Deserialize)]
struct ComponentList {
    #[serde(rename = "Component", default)]
    components: Vec<TypedAmount>,
}

#[derive(Debug, Deserialize)]
struct FeeList {
    #[serde(rename = "Fee", default)]
    fees: Vec<TypedAmount>,
}

#[derive(Debug, Deserialize)]
struct TypedAmount {
    #[serde(rename = "Type")]
    kind: Option<String>,
    #[serde(rename = "Amount")]
    amount: Option<AmountNode>,
}

#[derive(Debug, Deserialize)]
struct AmountNode {
    #[serde(rename = "$text")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OtherTransactionNode {
    #[serde(rename = "TransactionType")]
    transaction_type: Option<String>,
    #[serde(rename = "AmazonOrderID")]
    order_id: Option<String>,
    #[serde(rename = "PostedDate")]
    posted_date: Option<String>,
    #[serde(rename = "Amount")]
    amount: Option<AmountNode>,
}

#[derive(Debug, Deserialize)]
struct AdvertisingNode {
    #[serde(rename = "TransactionType")]
    transaction_type: Option<String>,
    #[serde(rename = "PostedDate")]
    posted_date: Option<String>,
    #[serde(rename = "Amount")]
    amount: Option<AmountNode>,
}

/// Parse a settlement document supplied as raw bytes.
pub fn parse_settlement_bytes(
    bytes: &[u8],
    brand: &str,
) -> Result<(Vec<SettlementTransaction>, usize), IngestError> {
    let xml = std::str::from_utf8(bytes)
        .map_err(|_| IngestError::MalformedDocument("not valid UTF-8 text".to_string()))?;
    parse_settlement(xml, brand)
}

/// Parse a settlement document into flat transaction rows plus a record
/// count. Missing optional fields default to empty/zero; only a document
/// that fails to deserialize at all is an error.
pub fn parse_settlement(
    xml: &str,
    brand: &str,
) -> Result<(Vec<SettlementTransaction>, usize), IngestError> {
    let envelope: Envelope =
        from_str(xml).map_err(|e| IngestError::MalformedDocument(e.to_string()))?;

    let created_at = now_utc();
    let mut records = Vec::new();

    for message in &envelope.messages {
        let Some(report) = &message.settlement_report else {
            continue;
        };

        for order in &report.orders {
            for fulfillment in &order.fulfillments {
                let posted_date = fulfillment
                    .posted_date
                    .as_deref()
                    .and_then(parse_posted_date);

                for item in &fulfillment.items {
                    let mut principal = 0.0;
                    let mut shipping = 0.0;
                    let mut tax = 0.0;
                    if let Some(prices) = &item.item_price {
                        for component in &prices.components {
                            let kind = component.kind.as_deref().unwrap_or("");
                            let amount = amount_value(&component.amount);
                            if kind == "Principal" {
                                principal += amount;
                            } else if kind == "Shipping" {
                                shipping += amount;
                            } else if kind.contains("Tax") && !kind.contains("Facilitator") {
                                // Single assignment: the last tax component
                                // wins, unlike fees which accumulate.
                                tax = amount;
                            }
                        }
                    }

                    let mut fba = 0.0;
                    let mut commission = 0.0;
                    let mut other = 0.0;
                    if let Some(fees) = &item.item_fees {
                        for fee in &fees.fees {
                            let kind = fee.kind.as_deref().unwrap_or("");
                            let amount = amount_value(&fee.amount);
                            if kind.contains("FBA") {
                                fba += amount;
                            } else if kind.contains("Commission") {
                                commission += amount;
                            } else {
                                other += amount;
                            }
                        }
                    }

                    let total = principal + shipping + tax + fba + commission + other;
                    records.push(SettlementTransaction {
                        id: uuid::Uuid::new_v4().to_string(),
                        brand: brand.to_string(),
                        created_at,
                        order_id: order.order_id.clone(),
                        posted_date,
                        kind: TransactionKind::Order,
                        marketplace: order.marketplace.clone(),
                        sku: item.sku.clone(),
                        quantity: parse_quantity(&item.quantity),
                        principal_amount: principal,
                        shipping_amount: shipping,
                        tax_amount: tax,
                        commission_fee: commission,
                        fba_fee: fba,
                        other_fees: other,
                        total_amount: total,
                        description: None,
                    });
                }
            }
        }

        for transaction in &report.other_transactions {
            records.push(SettlementTransaction {
                id: uuid::Uuid::new_v4().to_string(),
                brand: brand.to_string(),
                created_at,
                order_id: transaction.order_id.clone(),
                posted_date: transaction.posted_date.as_deref().and_then(parse_posted_date),
                kind: TransactionKind::OtherTransaction,
                marketplace: None,
                sku: None,
                quantity: 0,
                principal_amount: 0.0,
                shipping_amount: 0.0,
                tax_amount: 0.0,
                commission_fee: 0.0,
                fba_fee: 0.0,
                other_fees: 0.0,
                total_amount: amount_value(&transaction.amount),
                description: transaction.transaction_type.clone(),
            });
        }

        for advert in &report.advertising {
            records.push(SettlementTransaction {
                id: uuid::Uuid::new_v4().to_string(),
                brand: brand.to_string(),
                created_at,
                order_id: None,
                posted_date: advert.posted_date.as_deref().and_then(parse_posted_date),
                kind: TransactionKind::Advertising,
                marketplace: None,
                sku: None,
                quantity: 0,
                principal_amount: 0.0,
                shipping_amount: 0.0,
                tax_amount: 0.0,
                commission_fee: 0.0,
                fba_fee: 0.0,
                other_fees: 0.0,
                total_amount: amount_value(&advert.amount),
                description: advert.transaction_type.clone(),
            });
        }
    }

    let count = records.len();
    info!(brand, count, "parsed settlement document");
    Ok((records, count))
}

fn amount_value(amount: &Option<AmountNode>) -> f64 {
    amount
        .as_ref()
        .and_then(|node| node.value.as_ref())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0.0)
}

fn parse_quantity(quantity: &Option<String>) -> i64 {
    quantity
        .as_ref()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn order_xml(components: &str, fees: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<AmazonEnvelope>
  <Message>
    <SettlementReport>
      <Order>
        <AmazonOrderID>123-4567890-1234567</AmazonOrderID>
        <MarketplaceName>Amazon.com</MarketplaceName>
        <Fulfillment>
          <PostedDate>2026-03-01T10:15:30+00:00</PostedDate>
          <Item>
            <SKU>BP-MUG-01</SKU>
            <Quantity>2</Quantity>
            <ItemPrice>{components}</ItemPrice>
            <ItemFees>{fees}</ItemFees>
          </Item>
        </Fulfillment>
      </Order>
    </SettlementReport>
  </Message>
</AmazonEnvelope>"#
        )
    }

    #[test]
    fn order_item_totals_and_fields() {
        let xml = order_xml(
            "<Component><Type>Principal</Type><Amount currency=\"USD\">10.00</Amount></Component>\
             <Component><Type>Shipping</Type><Amount currency=\"USD\">2.00</Amount></Component>",
            "<Fee><Type>FBAPerUnitFulfillmentFee</Type><Amount currency=\"USD\">1.50</Amount></Fee>\
             <Fee><Type>Commission</Type><Amount currency=\"USD\">1.00</Amount></Fee>",
        );

        let (records, count) = parse_settlement(&xml, "Acme").unwrap();
        assert_eq!(count, 1);
        assert_eq!(records.len(), count);

        let record = &records[0];
        assert_eq!(record.brand, "Acme");
        assert_eq!(record.kind, TransactionKind::Order);
        assert_eq!(record.order_id.as_deref(), Some("123-4567890-1234567"));
        assert_eq!(record.marketplace.as_deref(), Some("Amazon.com"));
        assert_eq!(record.sku.as_deref(), Some("BP-MUG-01"));
        assert_eq!(record.quantity, 2);
        assert!((record.principal_amount - 10.0).abs() < EPSILON);
        assert!((record.shipping_amount - 2.0).abs() < EPSILON);
        assert!(record.tax_amount.abs() < EPSILON);
        assert!((record.fba_fee - 1.50).abs() < EPSILON);
        assert!((record.commission_fee - 1.00).abs() < EPSILON);
        assert!(record.other_fees.abs() < EPSILON);
        assert!((record.total_amount - 14.50).abs() < EPSILON);
        assert!(record.posted_date.is_some());
    }

    #[test]
    fn total_equals_component_sum() {
        let xml = order_xml(
            "<Component><Type>Principal</Type><Amount>25.00</Amount></Component>\
             <Component><Type>Shipping</Type><Amount>3.50</Amount></Component>\
             <Component><Type>ShippingTax</Type><Amount>0.25</Amount></Component>",
            "<Fee><Type>FBAPerUnitFulfillmentFee</Type><Amount>-2.10</Amount></Fee>\
             <Fee><Type>Commission</Type><Amount>-3.75</Amount></Fee>\
             <Fee><Type>GiftwrapChargeback</Type><Amount>-0.40</Amount></Fee>",
        );

        let (records, _) = parse_settlement(&xml, "Acme").unwrap();
        let record = &records[0];
        let expected = record.principal_amount
            + record.shipping_amount
            + record.tax_amount
            + record.fba_fee
            + record.commission_fee
            + record.other_fees;
        assert!((record.total_amount - expected).abs() < EPSILON);
        assert!((record.other_fees - (-0.40)).abs() < EPSILON);
    }

    #[test]
    fn facilitator_tax_is_excluded() {
        let xml = order_xml(
            "<Component><Type>Principal</Type><Amount>10.00</Amount></Component>\
             <Component><Type>Tax_Facilitator</Type><Amount>0.50</Amount></Component>",
            "",
        );

        let (records, _) = parse_settlement(&xml, "Acme").unwrap();
        assert!(records[0].tax_amount.abs() < EPSILON);
        assert!((records[0].total_amount - 10.0).abs() < EPSILON);
    }

    #[test]
    fn shipping_tax_assigns_last_wins() {
        let xml = order_xml(
            "<Component><Type>ShippingTax</Type><Amount>0.30</Amount></Component>\
             <Component><Type>Tax</Type><Amount>0.70</Amount></Component>",
            "",
        );

        let (records, _) = parse_settlement(&xml, "Acme").unwrap();
        // Last tax-typed component wins; they are not summed.
        assert!((records[0].tax_amount - 0.70).abs() < EPSILON);
    }

    #[test]
    fn other_and_advertising_transactions() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<AmazonEnvelope>
  <Message>
    <SettlementReport>
      <OtherTransaction>
        <TransactionType>StorageFee</TransactionType>
        <AmazonOrderID>999-0000000-0000001</AmazonOrderID>
        <PostedDate>2026-03-02T00:00:00+00:00</PostedDate>
        <Amount currency="USD">-3.25</Amount>
      </OtherTransaction>
      <AdvertisingTransactionDetails>
        <TransactionType>ProductAds</TransactionType>
        <PostedDate>2026-03-03T00:00:00+00:00</PostedDate>
        <Amount currency="USD">-12.00</Amount>
      </AdvertisingTransactionDetails>
    </SettlementReport>
  </Message>
</AmazonEnvelope>"#;

        let (records, count) = parse_settlement(xml, "Acme").unwrap();
        assert_eq!(count, 2);

        let other = &records[0];
        assert_eq!(other.kind, TransactionKind::OtherTransaction);
        assert_eq!(other.description.as_deref(), Some("StorageFee"));
        assert_eq!(other.order_id.as_deref(), Some("999-0000000-0000001"));
        assert!((other.total_amount - (-3.25)).abs() < EPSILON);
        assert!(other.principal_amount.abs() < EPSILON);

        let advert = &records[1];
        assert_eq!(advert.kind, TransactionKind::Advertising);
        assert_eq!(advert.description.as_deref(), Some("ProductAds"));
        assert!(advert.order_id.is_none());
        assert!((advert.total_amount - (-12.00)).abs() < EPSILON);
    }

    #[test]
    fn unparseable_posted_date_is_tolerated() {
        let xml = r#"<AmazonEnvelope>
  <Message>
    <SettlementReport>
      <Order>
        <AmazonOrderID>1</AmazonOrderID>
        <Fulfillment>
          <PostedDate>sometime next week</PostedDate>
          <Item>
            <SKU>BP-1</SKU>
            <Quantity>1</Quantity>
          </Item>
        </Fulfillment>
      </Order>
    </SettlementReport>
  </Message>
</AmazonEnvelope>"#;

        let (records, count) = parse_settlement(xml, "Acme").unwrap();
        assert_eq!(count, 1);
        assert!(records[0].posted_date.is_none());
        assert_eq!(records[0].quantity, 1);
    }

    #[test]
    fn empty_envelope_yields_no_records() {
        let (records, count) = parse_settlement("<AmazonEnvelope></AmazonEnvelope>", "Acme").unwrap();
        assert!(records.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn non_xml_input_is_malformed() {
        let err = parse_settlement("this is not xml at all {", "Acme").unwrap_err();
        assert!(matches!(err, IngestError::MalformedDocument(_)));

        let err = parse_settlement_bytes(&[0xff, 0xfe, 0x00], "Acme").unwrap_err();
        assert!(matches!(err, IngestError::MalformedDocument(_)));
    }
}
