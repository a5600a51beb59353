//! The four pipeline stages wired together
//!
//! Loader, cleaner, persister and reporter run strictly one after another.
//! The store handle is opened after the input is known to be good and is
//! closed on every path once it has been opened.

use crate::clean::{clean_transactions, CleanStats, CleanedTable};
use crate::config::{InputConfig, PipelineConfig, StoreBackend, StoreConfig};
use crate::data::{load_transactions, LoadSummary};
use crate::error::Result;
use crate::mongo::MongoStore;
use crate::report::Reports;
use crate::store::{build_reports, persist, InMemoryStore, PersistSummary, TransactionStore};
use crate::viz::render_reports;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything a run produced, for the operator summary
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub load: LoadSummary,
    pub clean: CleanStats,
    pub persist: PersistSummary,
    pub reports: Reports,
    pub charts: Vec<PathBuf>,
}

/// Output of the stages that need the store
#[derive(Debug, Clone)]
pub struct Published {
    pub persist: PersistSummary,
    pub reports: Reports,
    pub charts: Vec<PathBuf>,
}

/// Run the whole pipeline once
pub async fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let (load, cleaned) = prepare(&config.input)?;

    let store = open_store(&config.store).await?;
    let published = publish(store.as_ref(), &cleaned, config).await;
    let closed = store.close().await;

    let published = published?;
    closed?;

    Ok(RunSummary {
        load,
        clean: cleaned.stats,
        persist: published.persist,
        reports: published.reports,
        charts: published.charts,
    })
}

/// Load and clean the input file
pub fn prepare(input: &InputConfig) -> Result<(LoadSummary, CleanedTable)> {
    let table = load_transactions(input)?;
    let load = table.summary();
    info!(
        rows = load.rows,
        missing_customer_id = load.missing_customer_id,
        missing_description = load.missing_description,
        "input loaded"
    );

    let cleaned = clean_transactions(table)?;
    Ok((load, cleaned))
}

pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn TransactionStore>> {
    match config.backend {
        StoreBackend::Mongo => Ok(Box::new(MongoStore::connect(config).await?)),
        StoreBackend::Memory => {
            warn!("using the in-memory store, nothing is persisted past this run");
            Ok(Box::new(InMemoryStore::new()))
        }
    }
}

/// Persist the cleaned records, then aggregate and render the reports
pub async fn publish(
    store: &dyn TransactionStore,
    cleaned: &CleanedTable,
    config: &PipelineConfig,
) -> Result<Published> {
    if config.store.reset {
        store.reset().await?;
    }

    let persist = persist(store, &cleaned.records).await?;
    let reports = build_reports(store, config.report.top_n).await?;
    let charts = render_reports(&reports, &config.report)?;

    Ok(Published {
        persist,
        reports,
        charts,
    })
}
