//! Pipeline configuration
//!
//! Every option has a default, so an empty TOML file (or none at all) yields
//! the stock setup: `data.csv` in ISO-8859-1, a local MongoDB, PNG charts.

use crate::error::{PipelineError, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest accepted `top_n`
pub const MAX_TOP_N: usize = 1_000;

/// Text encoding of the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// ISO-8859-1, one byte per character
    #[serde(alias = "iso-8859-1")]
    Latin1,
    Utf8,
}

impl Encoding {
    /// Decode raw file bytes into text
    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            // Every byte is a valid code point in U+0000..=U+00FF
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|e| PipelineError::Encoding {
                encoding: "UTF-8".to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Which document store implementation backs the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    /// Process-local store, nothing is persisted past the run
    Memory,
}

/// Image format of the rendered charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

/// X axis used by the monthly sales chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlyAxis {
    /// Months placed on a calendar scale, labelled `YYYY-MM`
    Calendar,
    /// Months placed at their row index in the sorted result
    Positional,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub path: PathBuf,
    pub encoding: Encoding,
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.csv"),
            encoding: Encoding::Latin1,
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub connect_timeout_secs: u64,
    /// Drop existing documents before inserting
    pub reset: bool,
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongo,
            uri: "mongodb://localhost:27017/".to_string(),
            database: "ecommerce_db".to_string(),
            collection: "transactions".to_string(),
            connect_timeout_secs: 5,
            reset: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub format: ChartFormat,
    pub top_n: usize,
    pub monthly_axis: MonthlyAxis,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("charts"),
            format: ChartFormat::Png,
            top_n: 10,
            monthly_axis: MonthlyAxis::Calendar,
        }
    }
}

/// Complete configuration of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub store: StoreConfig,
    pub report: ReportConfig,
}

impl PipelineConfig {
    /// Read and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input.delimiter.is_ascii() {
            return Err(PipelineError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.input.delimiter
            )));
        }
        if self.store.database.trim().is_empty() {
            return Err(PipelineError::Config("database name is empty".to_string()));
        }
        if self.store.collection.trim().is_empty() {
            return Err(PipelineError::Config("collection name is empty".to_string()));
        }
        if self.store.connect_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.report.top_n == 0 {
            return Err(PipelineError::Config("top_n must be at least 1".to_string()));
        }
        if self.report.top_n > MAX_TOP_N {
            return Err(PipelineError::Config(format!(
                "top_n must be at most {}, got {}",
                MAX_TOP_N, self.report.top_n
            )));
        }
        Ok(())
    }
}
