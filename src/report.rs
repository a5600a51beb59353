//! Aggregate report rows and the ordering rules shared by every store

use crate::data::Transaction;
use chrono::Datelike;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Units sold for one product description
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub description: String,
    pub total_sales: i64,
}

/// Calendar month key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Months since year 0, so consecutive months differ by one
    pub fn ordinal(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Revenue for one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySales {
    pub period: YearMonth,
    pub total_sales: f64,
}

/// Revenue for one customer
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRevenue {
    pub customer_id: i64,
    pub total_revenue: f64,
}

/// The three report results of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reports {
    pub top_products: Vec<ProductSales>,
    pub monthly_sales: Vec<MonthlySales>,
    pub top_customers: Vec<CustomerRevenue>,
}

/// Total descending, then description ascending
pub fn product_order(a: &ProductSales, b: &ProductSales) -> Ordering {
    b.total_sales
        .cmp(&a.total_sales)
        .then_with(|| a.description.cmp(&b.description))
}

/// Revenue descending, then customer id ascending
pub fn customer_order(a: &CustomerRevenue, b: &CustomerRevenue) -> Ordering {
    b.total_revenue
        .total_cmp(&a.total_revenue)
        .then_with(|| a.customer_id.cmp(&b.customer_id))
}

/// Group by description and keep the `limit` best sellers
pub fn top_products<'a, I>(records: I, limit: usize) -> Vec<ProductSales>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for record in records {
        *totals.entry(record.description.as_str()).or_default() += record.quantity;
    }

    let mut rows: Vec<ProductSales> = totals
        .into_iter()
        .map(|(description, total_sales)| ProductSales {
            description: description.to_string(),
            total_sales,
        })
        .collect();
    rows.sort_by(product_order);
    rows.truncate(limit);
    rows
}

/// Group by calendar month of the invoice date, oldest first
pub fn monthly_sales<'a, I>(records: I) -> Vec<MonthlySales>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for record in records {
        let period = YearMonth::new(record.invoice_date.year(), record.invoice_date.month());
        *totals.entry(period).or_default() += record.revenue();
    }

    totals
        .into_iter()
        .map(|(period, total_sales)| MonthlySales {
            period,
            total_sales,
        })
        .collect()
}

/// Group by customer and keep the `limit` highest spenders
pub fn top_customers<'a, I>(records: I, limit: usize) -> Vec<CustomerRevenue>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals: HashMap<i64, f64> = HashMap::new();
    for record in records {
        *totals.entry(record.customer_id).or_default() += record.revenue();
    }

    let mut rows: Vec<CustomerRevenue> = totals
        .into_iter()
        .map(|(customer_id, total_revenue)| CustomerRevenue {
            customer_id,
            total_revenue,
        })
        .collect();
    rows.sort_by(customer_order);
    rows.truncate(limit);
    rows
}
