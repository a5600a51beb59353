//! Document store abstraction, the in-process backend and the persist stage

use crate::data::Transaction;
use crate::error::Result;
use crate::report::{self, CustomerRevenue, MonthlySales, ProductSales, Reports};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// A cleaned record together with the identifier the store assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTransaction {
    pub id: ObjectId,
    pub record: Transaction,
}

/// Handle to one collection of transaction documents
///
/// The handle is opened once per run and passed by reference to every stage.
/// `close` must be called before the handle is dropped.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert one document per record and return how many were written
    async fn insert_many(&self, records: &[Transaction]) -> Result<u64>;

    /// Any single document from the collection
    async fn find_one(&self) -> Result<Option<StoredTransaction>>;

    async fn count(&self) -> Result<u64>;

    /// Remove every document from the collection
    async fn reset(&self) -> Result<()>;

    async fn top_products(&self, limit: usize) -> Result<Vec<ProductSales>>;

    async fn monthly_sales(&self) -> Result<Vec<MonthlySales>>;

    async fn top_customers(&self, limit: usize) -> Result<Vec<CustomerRevenue>>;

    async fn close(&self) -> Result<()>;
}

/// Collection kept in process memory for dry runs and tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: Mutex<Vec<StoredTransaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> MutexGuard<'_, Vec<StoredTransaction>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn insert_many(&self, records: &[Transaction]) -> Result<u64> {
        let mut documents = self.documents();
        documents.extend(records.iter().map(|record| StoredTransaction {
            id: ObjectId::new(),
            record: record.clone(),
        }));
        debug!(inserted = records.len(), total = documents.len(), "in-memory insert");
        Ok(records.len() as u64)
    }

    async fn find_one(&self) -> Result<Option<StoredTransaction>> {
        Ok(self.documents().first().cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.documents().len() as u64)
    }

    async fn reset(&self) -> Result<()> {
        self.documents().clear();
        Ok(())
    }

    async fn top_products(&self, limit: usize) -> Result<Vec<ProductSales>> {
        let documents = self.documents();
        Ok(report::top_products(
            documents.iter().map(|d| &d.record),
            limit,
        ))
    }

    async fn monthly_sales(&self) -> Result<Vec<MonthlySales>> {
        let documents = self.documents();
        Ok(report::monthly_sales(documents.iter().map(|d| &d.record)))
    }

    async fn top_customers(&self, limit: usize) -> Result<Vec<CustomerRevenue>> {
        let documents = self.documents();
        Ok(report::top_customers(
            documents.iter().map(|d| &d.record),
            limit,
        ))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// What the persist stage observed
#[derive(Debug, Clone, PartialEq)]
pub struct PersistSummary {
    pub inserted: u64,
    /// Documents in the collection after the insert
    pub collection_count: u64,
    pub sample: Option<StoredTransaction>,
}

/// Bulk-insert the cleaned records, then read back one document and the count
pub async fn persist(
    store: &dyn TransactionStore,
    records: &[Transaction],
) -> Result<PersistSummary> {
    let inserted = if records.is_empty() {
        0
    } else {
        store.insert_many(records).await?
    };
    info!(inserted, "documents inserted");

    let sample = store.find_one().await?;
    if let Some(sample) = &sample {
        info!(id = %sample.id, record = ?sample.record, "sample document");
    }

    let collection_count = store.count().await?;
    info!(collection_count, "total documents in collection");

    Ok(PersistSummary {
        inserted,
        collection_count,
        sample,
    })
}

/// Run the three aggregation queries
pub async fn build_reports(store: &dyn TransactionStore, top_n: usize) -> Result<Reports> {
    let top_products = store.top_products(top_n).await?;
    debug!(rows = top_products.len(), "top products aggregated");

    let monthly_sales = store.monthly_sales().await?;
    debug!(rows = monthly_sales.len(), "monthly sales aggregated");

    let top_customers = store.top_customers(top_n).await?;
    debug!(rows = top_customers.len(), "top customers aggregated");

    Ok(Reports {
        top_products,
        monthly_sales,
        top_customers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::YearMonth;
    use chrono::NaiveDate;

    fn tx(
        invoice_no: &str,
        description: &str,
        quantity: i64,
        price: f64,
        customer: i64,
    ) -> Transaction {
        Transaction {
            invoice_no: invoice_no.to_string(),
            stock_code: "22633".to_string(),
            description: description.to_string(),
            quantity,
            invoice_date: NaiveDate::from_ymd_opt(2011, 5, 17)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap(),
            unit_price: price,
            customer_id: customer,
            country: "Germany".to_string(),
        }
    }

    #[tokio::test]
    async fn test_persist_counts_inserted_documents() {
        let store = InMemoryStore::new();
        let records = vec![tx("1", "MUG", 2, 1.5, 7), tx("2", "CUP", 1, 0.5, 8)];

        let summary = persist(&store, &records).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.collection_count, 2);
        assert_eq!(summary.sample.unwrap().record, records[0]);
    }

    #[tokio::test]
    async fn test_repeated_persist_duplicates() {
        let store = InMemoryStore::new();
        let records = vec![tx("1", "MUG", 2, 1.5, 7)];

        persist(&store, &records).await.unwrap();
        let summary = persist(&store, &records).await.unwrap();
        assert_eq!(summary.collection_count, 2);

        store.reset().await.unwrap();
        let summary = persist(&store, &records).await.unwrap();
        assert_eq!(summary.collection_count, 1);
    }

    #[tokio::test]
    async fn test_persist_empty_table() {
        let store = InMemoryStore::new();
        let summary = persist(&store, &[]).await.unwrap();
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.collection_count, 0);
        assert!(summary.sample.is_none());
    }

    #[tokio::test]
    async fn test_build_reports() {
        let store = InMemoryStore::new();
        store
            .insert_many(&[
                tx("1", "MUG", 2, 1.5, 7),
                tx("2", "CUP", 5, 0.5, 8),
                tx("3", "MUG", 1, 1.5, 8),
            ])
            .await
            .unwrap();

        let reports = build_reports(&store, 1).await.unwrap();
        assert_eq!(reports.top_products.len(), 1);
        assert_eq!(reports.top_products[0].description, "CUP");
        assert_eq!(reports.top_products[0].total_sales, 5);

        assert_eq!(reports.monthly_sales.len(), 1);
        assert_eq!(reports.monthly_sales[0].period, YearMonth::new(2011, 5));
        assert!((reports.monthly_sales[0].total_sales - 7.0).abs() < 1e-9);

        assert_eq!(reports.top_customers.len(), 1);
        assert_eq!(reports.top_customers[0].customer_id, 8);
        assert!((reports.top_customers[0].total_revenue - 4.0).abs() < 1e-9);
    }
}
