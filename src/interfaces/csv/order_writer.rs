use crate::domain::order::Order;
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct AuditRow<'a> {
    order_id: &'a str,
    plan_id: &'a str,
    status: String,
    payment_method: Option<String>,
    period_start: NaiveDate,
    period_end: NaiveDate,
    days: u32,
    price: Decimal,
    recomputed_price: Decimal,
    price_matches: bool,
    currency: &'a str,
    processor_fee: Option<Decimal>,
    processor_net_amount: Option<Decimal>,
}

const HEADER: [&str; 13] = [
    "order_id",
    "plan_id",
    "status",
    "payment_method",
    "period_start",
    "period_end",
    "days",
    "price",
    "recomputed_price",
    "price_matches",
    "currency",
    "processor_fee",
    "processor_net_amount",
];

/// Totals for one audit run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuditSummary {
    pub orders: usize,
    pub mismatches: usize,
}

/// Writes the order audit report as CSV.
///
/// Each row re-derives the price from the stored pricing model and period,
/// so any order whose stored price drifted shows up with `price_matches=false`.
/// The header is written even when there are no orders.
pub struct OrderAuditWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderAuditWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    pub fn write_orders<'a, I>(&mut self, orders: I) -> Result<AuditSummary>
    where
        I: IntoIterator<Item = &'a Order>,
    {
        let mut summary = AuditSummary::default();
        self.writer.write_record(HEADER)?;
        for order in orders {
            let recomputed_price = order.recomputed_price();
            let price_matches = recomputed_price == order.price;
            summary.orders += 1;
            if !price_matches {
                summary.mismatches += 1;
            }
            self.writer.serialize(AuditRow {
                order_id: order.id.as_str(),
                plan_id: &order.plan_id,
                status: order.status.to_string(),
                payment_method: order.payment_method.map(|m| m.to_string()),
                period_start: order.period.start(),
                period_end: order.period.end(),
                days: order.period.number_of_days(),
                price: order.price,
                recomputed_price,
                price_matches,
                currency: &order.currency,
                processor_fee: order.processor_fee,
                processor_net_amount: order.processor_net_amount,
            })?;
        }
        self.writer.flush()?;
        Ok(summary)
    }
}
