//! Command-line interface definitions and argument parsing

use crate::config::{ChartFormat, Encoding, MonthlyAxis, PipelineConfig, StoreBackend};
use clap::Parser;
use std::path::PathBuf;

/// Load retail transactions into MongoDB and chart sales reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the input CSV file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Text encoding of the input file
    #[arg(long, value_enum)]
    pub encoding: Option<Encoding>,

    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI")]
    pub mongo_uri: Option<String>,

    /// Database name
    #[arg(long)]
    pub database: Option<String>,

    /// Collection name
    #[arg(long)]
    pub collection: Option<String>,

    /// Store backend
    #[arg(long, value_enum)]
    pub store: Option<StoreBackend>,

    /// Drop existing documents before inserting
    #[arg(long)]
    pub reset: bool,

    /// Directory the charts are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Chart image format
    #[arg(long, value_enum)]
    pub format: Option<ChartFormat>,

    /// Number of entries in the top products and top customers reports
    #[arg(long)]
    pub top: Option<usize>,

    /// Plot the monthly trend against row index instead of the calendar
    #[arg(long)]
    pub positional_months: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the run configuration: defaults, then the config file, then flags
    pub fn resolve_config(&self) -> crate::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(encoding) = self.encoding {
            config.input.encoding = encoding;
        }
        if let Some(uri) = &self.mongo_uri {
            config.store.uri = uri.clone();
        }
        if let Some(database) = &self.database {
            config.store.database = database.clone();
        }
        if let Some(collection) = &self.collection {
            config.store.collection = collection.clone();
        }
        if let Some(store) = self.store {
            config.store.backend = store;
        }
        if self.reset {
            config.store.reset = true;
        }
        if let Some(output_dir) = &self.output_dir {
            config.report.output_dir = output_dir.clone();
        }
        if let Some(format) = self.format {
            config.report.format = format;
        }
        if let Some(top) = self.top {
            config.report.top_n = top;
        }
        if self.positional_months {
            config.report.monthly_axis = MonthlyAxis::Positional;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "retailforge",
            "--input",
            "retail.csv",
            "--encoding",
            "utf8",
            "--store",
            "memory",
            "--collection",
            "tx_test",
            "--format",
            "svg",
            "--top",
            "5",
            "--positional-months",
            "--reset",
        ]);

        let config = args.resolve_config().unwrap();
        assert_eq!(config.input.path, PathBuf::from("retail.csv"));
        assert_eq!(config.input.encoding, Encoding::Utf8);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.collection, "tx_test");
        assert_eq!(config.store.database, "ecommerce_db");
        assert!(config.store.reset);
        assert_eq!(config.report.format, ChartFormat::Svg);
        assert_eq!(config.report.top_n, 5);
        assert_eq!(config.report.monthly_axis, MonthlyAxis::Positional);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store]\ndatabase = \"from_file\"\ncollection = \"file_tx\"").unwrap();
        writeln!(file, "[report]\ntop_n = 3").unwrap();

        let path = file.path().to_str().unwrap();
        let args = Args::parse_from(["retailforge", "--config", path, "--collection", "cli_tx"]);

        let config = args.resolve_config().unwrap();
        assert_eq!(config.store.database, "from_file");
        assert_eq!(config.store.collection, "cli_tx");
        assert_eq!(config.report.top_n, 3);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = Args::parse_from(["retailforge", "--top", "0"]);
        assert!(args.resolve_config().is_err());
    }
}
