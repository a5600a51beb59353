//! Row filtering and timestamp normalization

use crate::data::{RawTransaction, Transaction, TransactionTable};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::info;

/// Date-time layouts accepted for `InvoiceDate`, tried in order
const DATETIME_FORMATS: [&str; 6] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Row counts observed while cleaning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub rows_in: usize,
    pub dropped_missing_customer: usize,
    pub dropped_non_positive: usize,
    pub rows_out: usize,
}

/// Output of the cleaner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedTable {
    pub records: Vec<Transaction>,
    pub stats: CleanStats,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Turn the records back into load-boundary rows so they can be cleaned again
    pub fn to_table(&self) -> TransactionTable {
        TransactionTable::new(self.records.iter().map(RawTransaction::from).collect())
    }
}

/// Parse an `InvoiceDate` value in any supported layout
pub fn parse_invoice_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Some(parsed) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(parsed);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Filter and normalize a loaded table
///
/// Rows without a customer are dropped first, so their dates are never
/// parsed. Any remaining unparsable date fails the whole table. Rows with
/// a non-positive quantity or price are dropped last. Relative order is kept.
pub fn clean_transactions(table: TransactionTable) -> Result<CleanedTable> {
    let rows_in = table.rows.len();
    let mut stats = CleanStats {
        rows_in,
        ..CleanStats::default()
    };

    let with_customer: Vec<(usize, RawTransaction, i64)> = table
        .rows
        .into_iter()
        .enumerate()
        .filter_map(|(row, raw)| raw.customer_id.map(|id| (row, raw, id)))
        .collect();
    stats.dropped_missing_customer = rows_in - with_customer.len();

    let mut dated = Vec::with_capacity(with_customer.len());
    for (row, raw, customer_id) in with_customer {
        let invoice_date =
            parse_invoice_date(&raw.invoice_date).ok_or_else(|| PipelineError::InvalidDate {
                // Header is line 1
                line: row + 2,
                value: raw.invoice_date.clone(),
            })?;

        dated.push(Transaction {
            invoice_no: raw.invoice_no,
            stock_code: raw.stock_code,
            description: raw.description,
            quantity: raw.quantity,
            invoice_date,
            unit_price: raw.unit_price,
            customer_id,
            country: raw.country,
        });
    }

    let before_filter = dated.len();
    let records: Vec<Transaction> = dated.into_iter().filter(Transaction::is_valid).collect();
    stats.dropped_non_positive = before_filter - records.len();
    stats.rows_out = records.len();

    info!(
        rows_in = stats.rows_in,
        dropped_missing_customer = stats.dropped_missing_customer,
        dropped_non_positive = stats.dropped_non_positive,
        rows_out = stats.rows_out,
        "transactions cleaned"
    );

    Ok(CleanedTable { records, stats })
}
