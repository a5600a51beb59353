//! RetailForge: a batch pipeline for retail transaction reporting
//!
//! This library loads a retail transaction CSV, drops invalid rows, stores
//! the cleaned records in a MongoDB collection and charts three sales
//! reports (top products, monthly sales, top customers).

pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod mongo;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod viz;

// Re-export public items for easier access
pub use clean::{clean_transactions, CleanStats, CleanedTable};
pub use cli::Args;
pub use config::PipelineConfig;
pub use data::{load_transactions, RawTransaction, Transaction, TransactionTable};
pub use error::{PipelineError, Result};
pub use mongo::MongoStore;
pub use report::{CustomerRevenue, MonthlySales, ProductSales, Reports, YearMonth};
pub use store::{InMemoryStore, StoredTransaction, TransactionStore};
pub use viz::render_reports;
