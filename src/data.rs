//! Transaction records and CSV loading

use crate::config::InputConfig;
use crate::error::{PipelineError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use std::fs;
use tracing::{debug, info};

/// Header columns the input file must provide
pub const COLUMNS: [&str; 8] = [
    "InvoiceNo",
    "StockCode",
    "Description",
    "Quantity",
    "InvoiceDate",
    "UnitPrice",
    "CustomerID",
    "Country",
];

/// Format used when a cleaned timestamp is written back as text
/// Sub-second digits are only written when present
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One input row as typed at the load boundary
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "InvoiceNo")]
    pub invoice_no: String,
    #[serde(rename = "StockCode")]
    pub stock_code: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    /// Parsed by the cleaner, not here
    #[serde(rename = "InvoiceDate")]
    pub invoice_date: String,
    #[serde(rename = "UnitPrice")]
    pub unit_price: f64,
    #[serde(rename = "CustomerID", deserialize_with = "deserialize_customer_id")]
    pub customer_id: Option<i64>,
    #[serde(rename = "Country")]
    pub country: String,
}

/// A transaction that passed cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub invoice_no: String,
    pub stock_code: String,
    pub description: String,
    pub quantity: i64,
    pub invoice_date: NaiveDateTime,
    pub unit_price: f64,
    pub customer_id: i64,
    pub country: String,
}

impl Transaction {
    /// Line revenue, `Quantity * UnitPrice`
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }

    /// True when the record satisfies the cleaning post-condition
    pub fn is_valid(&self) -> bool {
        self.quantity > 0 && self.unit_price > 0.0
    }
}

impl From<&Transaction> for RawTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            invoice_no: tx.invoice_no.clone(),
            stock_code: tx.stock_code.clone(),
            description: tx.description.clone(),
            quantity: tx.quantity,
            invoice_date: tx.invoice_date.format(DATE_FORMAT).to_string(),
            unit_price: tx.unit_price,
            customer_id: Some(tx.customer_id),
            country: tx.country.clone(),
        }
    }
}

/// Accepts `17850` as well as `17850.0`, which is how the identifier
/// appears once a tool has widened the column to floating point.
fn deserialize_customer_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(Some(id));
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            Ok(Some(value as i64))
        }
        _ => Err(serde::de::Error::custom(format!(
            "invalid CustomerID '{}'",
            raw
        ))),
    }
}

/// Rows read from the input file, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTable {
    pub rows: Vec<RawTransaction>,
}

/// Shape of a freshly loaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: usize,
    pub missing_customer_id: usize,
    pub missing_description: usize,
}

impl TransactionTable {
    pub fn new(rows: Vec<RawTransaction>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            rows: self.rows.len(),
            missing_customer_id: self.rows.iter().filter(|r| r.customer_id.is_none()).count(),
            missing_description: self
                .rows
                .iter()
                .filter(|r| r.description.trim().is_empty())
                .count(),
        }
    }
}

/// Load the transaction file described by `input`
///
/// # Arguments
/// * `input` - Path, encoding and delimiter of the file
///
/// # Returns
/// * `TransactionTable` with one typed row per data line
pub fn load_transactions(input: &InputConfig) -> Result<TransactionTable> {
    info!(path = %input.path.display(), encoding = ?input.encoding, "loading transactions");

    let bytes = fs::read(&input.path)?;
    let text = input.encoding.decode(bytes)?;
    let delimiter = u8::try_from(input.delimiter).map_err(|_| {
        PipelineError::Config(format!(
            "delimiter must be a single ASCII character, got '{}'",
            input.delimiter
        ))
    })?;
    let table = parse_transactions(&text, delimiter)?;

    debug!(rows = table.len(), "input parsed");
    Ok(table)
}

/// Parse already decoded CSV text
pub fn parse_transactions(text: &str, delimiter: u8) -> Result<TransactionTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if let Some(missing) = COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(PipelineError::MissingColumn(missing.to_string()));
    }

    let rows = reader
        .deserialize::<RawTransaction>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    Ok(TransactionTable::new(rows))
}
