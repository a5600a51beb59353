//! RetailForge: load retail transactions into MongoDB and chart sales reports
//!
//! This is the main entrypoint: it resolves the configuration, runs the
//! pipeline once and prints an operator summary.

use anyhow::{Context, Result};
use clap::Parser;
use retailforge::logging::init_logging;
use retailforge::pipeline::{self, RunSummary};
use retailforge::{Args, PipelineConfig};
use std::time::Instant;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args
        .resolve_config()
        .context("failed to resolve configuration")?;

    if args.verbose {
        println!("RetailForge - Retail Sales Pipeline");
        println!("===================================\n");
        println!("  Input file: {}", config.input.path.display());
        println!(
            "  Store: {:?} {}/{}",
            config.store.backend, config.store.database, config.store.collection
        );
        println!("  Chart directory: {}\n", config.report.output_dir.display());
    }

    let start_time = Instant::now();
    let summary = pipeline::run(&config)
        .await
        .with_context(|| format!("pipeline run over '{}' failed", config.input.path.display()))?;

    print_summary(&config, &summary, args.verbose);
    println!("\nTotal processing time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

fn print_summary(config: &PipelineConfig, summary: &RunSummary, verbose: bool) {
    println!("=== Pipeline Complete ===");
    println!("✓ Rows loaded: {}", summary.load.rows);
    println!(
        "✓ Rows cleaned: {} ({} without customer, {} with non-positive quantity or price)",
        summary.clean.rows_out,
        summary.clean.dropped_missing_customer,
        summary.clean.dropped_non_positive
    );
    println!("✓ Documents inserted: {}", summary.persist.inserted);
    println!(
        "✓ Total records in {}: {}",
        config.store.collection, summary.persist.collection_count
    );

    if verbose {
        if let Some(sample) = &summary.persist.sample {
            println!("\nSample document {}: {:?}", sample.id, sample.record);
        }

        println!("\n=== Top Customers by Revenue ===");
        for row in &summary.reports.top_customers {
            println!("  {:>8} | {:>12.2}", row.customer_id, row.total_revenue);
        }
    }

    println!();
    for path in &summary.charts {
        println!("Chart saved to: {}", path.display());
    }
}
