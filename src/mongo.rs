//! MongoDB backend for the transaction store

use crate::config::StoreConfig;
use crate::data::Transaction;
use crate::error::{PipelineError, Result};
use crate::report::{CustomerRevenue, MonthlySales, ProductSales, YearMonth};
use crate::store::{StoredTransaction, TransactionStore};
use async_trait::async_trait;
use chrono::DateTime;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::{debug, info};

#[derive(Debug)]
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect and make sure the server answers before any stage runs
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(config.uri.as_str()).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_selection_timeout = Some(config.connect_timeout());
        options.connect_timeout = Some(config.connect_timeout());

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        database.run_command(doc! { "ping": 1 }).await?;

        info!(
            database = %config.database,
            collection = %config.collection,
            "connected to MongoDB"
        );

        let collection = database.collection::<Document>(&config.collection);
        Ok(Self { client, collection })
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        debug!(?pipeline, "running aggregation");
        let cursor = self.collection.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }
}

#[async_trait]
impl TransactionStore for MongoStore {
    async fn insert_many(&self, records: &[Transaction]) -> Result<u64> {
        let documents: Vec<Document> = records.iter().map(to_document).collect();
        let result = self.collection.insert_many(documents).await?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn find_one(&self) -> Result<Option<StoredTransaction>> {
        match self.collection.find_one(doc! {}).await? {
            Some(document) => Ok(Some(from_document(&document)?)),
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn reset(&self) -> Result<()> {
        self.collection.drop().await?;
        info!(collection = %self.collection.name(), "collection dropped");
        Ok(())
    }

    async fn top_products(&self, limit: usize) -> Result<Vec<ProductSales>> {
        self.aggregate(top_products_pipeline(limit))
            .await?
            .iter()
            .map(|row| -> Result<ProductSales> {
                let description = match row.get("_id") {
                    Some(Bson::String(s)) => s.clone(),
                    Some(Bson::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Ok(ProductSales {
                    description,
                    total_sales: integer(row, "total_sales")?,
                })
            })
            .collect()
    }

    async fn monthly_sales(&self) -> Result<Vec<MonthlySales>> {
        self.aggregate(monthly_sales_pipeline())
            .await?
            .iter()
            .map(monthly_row)
            .collect()
    }

    async fn top_customers(&self, limit: usize) -> Result<Vec<CustomerRevenue>> {
        self.aggregate(top_customers_pipeline(limit))
            .await?
            .iter()
            .map(|row| -> Result<CustomerRevenue> {
                Ok(CustomerRevenue {
                    customer_id: integer(row, "_id")?,
                    total_revenue: number(row, "total_revenue")?,
                })
            })
            .collect()
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        debug!("MongoDB client shut down");
        Ok(())
    }
}

/// `$group` by description, units summed, best sellers first
pub fn top_products_pipeline(limit: usize) -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$Description", "total_sales": { "$sum": "$Quantity" } } },
        doc! { "$sort": { "total_sales": -1, "_id": 1 } },
        doc! { "$limit": limit_value(limit) },
    ]
}

/// `$group` by invoice year and month, revenue summed, oldest first
pub fn monthly_sales_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": {
                    "year": { "$year": "$InvoiceDate" },
                    "month": { "$month": "$InvoiceDate" },
                },
                "total_sales": { "$sum": { "$multiply": ["$Quantity", "$UnitPrice"] } },
            }
        },
        doc! { "$sort": { "_id.year": 1, "_id.month": 1 } },
    ]
}

/// `$group` by customer, revenue summed, biggest spenders first
pub fn top_customers_pipeline(limit: usize) -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": "$CustomerID",
                "total_revenue": { "$sum": { "$multiply": ["$Quantity", "$UnitPrice"] } },
            }
        },
        doc! { "$sort": { "total_revenue": -1, "_id": 1 } },
        doc! { "$limit": limit_value(limit) },
    ]
}

/// Decode one `monthly_sales_pipeline` output row
fn monthly_row(row: &Document) -> Result<MonthlySales> {
    let key = row.get_document("_id")?;
    let month = integer(key, "month")?;
    let month = u32::try_from(month).map_err(|_| {
        PipelineError::MalformedDocument(format!("month out of range: {}", month))
    })?;
    let year = integer(key, "year")?;
    let year = i32::try_from(year).map_err(|_| {
        PipelineError::MalformedDocument(format!("year out of range: {}", year))
    })?;
    Ok(MonthlySales {
        period: YearMonth::new(year, month),
        total_sales: number(row, "total_sales")?,
    })
}

fn limit_value(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

pub fn to_document(record: &Transaction) -> Document {
    doc! {
        "InvoiceNo": record.invoice_no.as_str(),
        "StockCode": record.stock_code.as_str(),
        "Description": record.description.as_str(),
        "Quantity": record.quantity,
        "InvoiceDate": BsonDateTime::from_millis(record.invoice_date.and_utc().timestamp_millis()),
        "UnitPrice": record.unit_price,
        "CustomerID": record.customer_id,
        "Country": record.country.as_str(),
    }
}

pub fn from_document(document: &Document) -> Result<StoredTransaction> {
    let id = document.get_object_id("_id")?;
    let millis = document.get_datetime("InvoiceDate")?.timestamp_millis();
    let invoice_date = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| {
            PipelineError::MalformedDocument(format!("InvoiceDate out of range: {}", millis))
        })?
        .naive_utc();

    Ok(StoredTransaction {
        id,
        record: Transaction {
            invoice_no: document.get_str("InvoiceNo")?.to_string(),
            stock_code: document.get_str("StockCode")?.to_string(),
            description: document.get_str("Description")?.to_string(),
            quantity: integer(document, "Quantity")?,
            invoice_date,
            unit_price: number(document, "UnitPrice")?,
            customer_id: integer(document, "CustomerID")?,
            country: document.get_str("Country")?.to_string(),
        },
    })
}

/// Aggregation output may come back as any BSON numeric type
fn integer(document: &Document, key: &str) -> Result<i64> {
    match document.get(key) {
        Some(Bson::Int32(v)) => Ok(*v as i64),
        Some(Bson::Int64(v)) => Ok(*v),
        Some(Bson::Double(v)) if v.fract() == 0.0 => Ok(*v as i64),
        other => Err(PipelineError::MalformedDocument(format!(
            "field '{}' is not an integer: {:?}",
            key, other
        ))),
    }
}

fn number(document: &Document, key: &str) -> Result<f64> {
    match document.get(key) {
        Some(Bson::Int32(v)) => Ok(*v as f64),
        Some(Bson::Int64(v)) => Ok(*v as f64),
        Some(Bson::Double(v)) => Ok(*v),
        other => Err(PipelineError::MalformedDocument(format!(
            "field '{}' is not numeric: {:?}",
            key, other
        ))),
    }
}
