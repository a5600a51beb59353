//! Integration tests for RetailForge

use retailforge::config::{ChartFormat, InputConfig, PipelineConfig, StoreBackend};
use retailforge::pipeline::{prepare, publish, run};
use retailforge::{InMemoryStore, MongoStore, PipelineError, TransactionStore, YearMonth};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile, TempDir};

const HEADER: &str =
    "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

/// Create a test CSV file with the given data lines
fn create_test_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

/// The three-row scenario: one valid row, one negative quantity, one missing customer
fn three_row_fixture() -> NamedTempFile {
    create_test_csv(&[
        "1001,A1,A,2,2023-01-05,5.0,1,United Kingdom",
        "1002,B1,B,-1,2023-01-06,3.0,1,United Kingdom",
        "1003,C1,C,1,2023-01-07,2.0,,United Kingdom",
    ])
}

fn retail_fixture() -> NamedTempFile {
    create_test_csv(&[
        "536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850.0,United Kingdom",
        "536365,71053,WHITE METAL LANTERN,6,12/1/2010 8:26,3.39,17850.0,United Kingdom",
        "536366,22633,HAND WARMER UNION JACK,6,12/1/2010 8:28,1.85,17850.0,United Kingdom",
        "536367,84406B,CREAM CUPID HEARTS COAT HANGER,8,12/1/2010 8:34,2.75,13047.0,United Kingdom",
        "C536379,D,Discount,-1,12/1/2010 9:41,27.5,14527.0,United Kingdom",
        "536414,22139,,56,12/1/2010 11:52,0,,United Kingdom",
        "539993,22386,JUMBO BAG PINK POLKADOT,10,1/4/2011 10:00,1.95,13313.0,United Kingdom",
        "539993,21499,BLUE POLKADOT WRAP,25,1/4/2011 10:00,0.42,13313.0,United Kingdom",
        "545220,21955,DOORMAT UNION JACK GUNS AND ROSES,2,3/1/2011 8:30,7.95,14620.0,United Kingdom",
        "545220,22556,WHITE METAL LANTERN,12,3/1/2011 8:30,3.39,14620.0,United Kingdom",
    ])
}

fn memory_config(input: &NamedTempFile, charts: &TempDir) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.input.path = input.path().to_path_buf();
    config.store.backend = StoreBackend::Memory;
    config.report.output_dir = charts.path().join("charts");
    config
}

#[tokio::test]
async fn test_three_row_scenario() {
    let input = three_row_fixture();
    let charts = tempdir().unwrap();

    let summary = run(&memory_config(&input, &charts)).await.unwrap();

    assert_eq!(summary.load.rows, 3);
    assert_eq!(summary.clean.rows_out, 1);
    assert_eq!(summary.persist.inserted, 1);
    assert_eq!(summary.persist.collection_count, 1);

    let top_customers = &summary.reports.top_customers;
    assert_eq!(top_customers.len(), 1);
    assert_eq!(top_customers[0].customer_id, 1);
    assert!((top_customers[0].total_revenue - 10.0).abs() < 1e-9);

    assert_eq!(summary.charts.len(), 3);
    assert!(summary.charts.iter().all(|p| p.exists()));
}

#[tokio::test]
async fn test_end_to_end_reports() {
    let input = retail_fixture();
    let charts = tempdir().unwrap();
    let mut config = memory_config(&input, &charts);
    config.report.format = ChartFormat::Svg;

    let summary = run(&config).await.unwrap();

    assert_eq!(summary.load.rows, 10);
    assert_eq!(summary.load.missing_customer_id, 1);
    assert_eq!(summary.clean.dropped_missing_customer, 1);
    assert_eq!(summary.clean.dropped_non_positive, 1);
    assert_eq!(summary.clean.rows_out, 8);
    assert_eq!(summary.persist.collection_count, 8);

    let products = &summary.reports.top_products;
    assert!(products.len() <= 10);
    assert_eq!(products[0].description, "BLUE POLKADOT WRAP");
    assert_eq!(products[0].total_sales, 25);
    assert_eq!(products[1].description, "WHITE METAL LANTERN");
    assert_eq!(products[1].total_sales, 18);
    assert!(products
        .windows(2)
        .all(|w| w[0].total_sales >= w[1].total_sales));

    let months: Vec<YearMonth> = summary
        .reports
        .monthly_sales
        .iter()
        .map(|m| m.period)
        .collect();
    assert_eq!(
        months,
        vec![
            YearMonth::new(2010, 12),
            YearMonth::new(2011, 1),
            YearMonth::new(2011, 3),
        ]
    );

    let customers = &summary.reports.top_customers;
    assert_eq!(customers[0].customer_id, 14620);
    let expected = 2.0 * 7.95 + 12.0 * 3.39;
    assert!((customers[0].total_revenue - expected).abs() < 1e-9);
    assert!(customers
        .windows(2)
        .all(|w| w[0].total_revenue >= w[1].total_revenue));
}

#[tokio::test]
async fn test_rerun_duplicates_unless_reset() {
    let input = three_row_fixture();
    let charts = tempdir().unwrap();
    let mut config = memory_config(&input, &charts);

    let store = InMemoryStore::new();
    let (_, cleaned) = prepare(&config.input).unwrap();

    publish(&store, &cleaned, &config).await.unwrap();
    let second = publish(&store, &cleaned, &config).await.unwrap();
    assert_eq!(second.persist.collection_count, 2);
    assert!((second.reports.top_customers[0].total_revenue - 20.0).abs() < 1e-9);

    config.store.reset = true;
    let third = publish(&store, &cleaned, &config).await.unwrap();
    assert_eq!(third.persist.collection_count, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_date_aborts_before_store() {
    let input = create_test_csv(&["1,A,Thing,1,someday,1.0,12345,Spain"]);
    let charts = tempdir().unwrap();

    let result = run(&memory_config(&input, &charts)).await;
    assert!(matches!(result, Err(PipelineError::InvalidDate { .. })));
    assert!(!charts.path().join("charts").exists());
}

#[tokio::test]
async fn test_missing_input_file() {
    let charts = tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.input = InputConfig {
        path: charts.path().join("missing.csv"),
        ..InputConfig::default()
    };
    config.store.backend = StoreBackend::Memory;

    assert!(matches!(run(&config).await, Err(PipelineError::Io(_))));
}

#[test]
fn test_cleaning_postcondition_on_fixture() {
    let input = retail_fixture();
    let config = InputConfig {
        path: input.path().to_path_buf(),
        ..InputConfig::default()
    };

    let (load, cleaned) = prepare(&config).unwrap();
    assert!(cleaned.len() <= load.rows);
    assert!(cleaned.records.iter().all(|r| r.quantity > 0 && r.unit_price > 0.0));

    let again = retailforge::clean_transactions(cleaned.to_table()).unwrap();
    assert_eq!(again.records, cleaned.records);
}

#[tokio::test]
#[ignore = "requires a running MongoDB at MONGODB_URI"]
async fn test_mongo_store_round_trip() {
    let mut config = PipelineConfig::default();
    if let Ok(uri) = std::env::var("MONGODB_URI") {
        config.store.uri = uri;
    }
    config.store.database = "retailforge_test".to_string();
    config.store.collection = "transactions_it".to_string();

    let input = three_row_fixture();
    let charts = tempdir().unwrap();
    config.input.path = input.path().to_path_buf();
    config.report.output_dir = charts.path().to_path_buf();
    config.store.reset = true;

    let store = MongoStore::connect(&config.store).await.unwrap();
    let (_, cleaned) = prepare(&config.input).unwrap();
    let published = publish(&store, &cleaned, &config).await;
    store.close().await.unwrap();

    let published = published.unwrap();
    assert_eq!(published.persist.collection_count, 1);
    assert_eq!(published.reports.top_customers[0].customer_id, 1);
    assert!((published.reports.top_customers[0].total_revenue - 10.0).abs() < 1e-9);
    assert_eq!(
        published.reports.monthly_sales[0].period,
        YearMonth::new(2023, 1)
    );
}
