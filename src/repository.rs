//! Dataset repository
//!
//! Loads the stock table from the first CSV file found among a list of
//! candidate paths and writes query results back out.

use crate::error::QueryError;
use crate::models::{Answer, Dataset, SecurityRecord};
use crate::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Raw CSV row, named after the file's column headers
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Stock Symbol")]
    symbol: String,
    #[serde(rename = "Stock Name")]
    name: String,
    #[serde(rename = "Price")]
    price: f64,
    #[serde(rename = "P/E Ratio", default)]
    pe_ratio: Option<f64>,
    #[serde(rename = "Performance (%)")]
    performance: f64,
    #[serde(rename = "Sector")]
    sector: String,
}

impl From<CsvRow> for SecurityRecord {
    fn from(row: CsvRow) -> Self {
        SecurityRecord {
            symbol: row.symbol.trim().to_string(),
            name: row.name.trim().to_string(),
            price: row.price,
            pe_ratio: row.pe_ratio,
            performance: row.performance,
            sector: row.sector.trim().to_string(),
        }
    }
}

/// File-backed dataset source
pub struct DatasetRepository {
    candidates: Vec<PathBuf>,
}

impl DatasetRepository {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Look for `path` as given, then under `data/`
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut candidates = vec![path.to_path_buf()];

        if let Some(file_name) = path.file_name() {
            let in_data = Path::new("data").join(file_name);
            if in_data != path {
                candidates.push(in_data);
            }
        }

        Self::new(candidates)
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Load and clean the first candidate that exists
    pub fn load(&self) -> Result<Dataset> {
        let Some(path) = self.candidates.iter().find(|p| p.is_file()) else {
            return Err(QueryError::DatasetNotFound {
                attempted: self.candidates.clone(),
            });
        };

        info!(path = %path.display(), "Loading stock data");
        let dataset = parse_csv(fs::File::open(path)?)?;
        info!(stocks = dataset.len(), "Loaded stock data");

        Ok(dataset)
    }
}

/// Parse stock rows, dropping repeated symbols (first occurrence wins)
pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in reader.deserialize::<CsvRow>() {
        let row = row.map_err(|e| QueryError::InvalidRecord {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let record = SecurityRecord::from(row);

        if !seen.insert(record.symbol.clone()) {
            warn!(symbol = %record.symbol, "Dropping duplicate symbol");
            continue;
        }
        records.push(record);
    }

    debug!(rows = records.len(), "Parsed stock rows");
    Dataset::new(records)
}

/// Write answers as a `query,response` CSV, creating parent directories
pub fn save_results(path: impl AsRef<Path>, answers: &[Answer]) -> Result<PathBuf> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    for answer in answers {
        writer.serialize(answer)?;
    }
    writer.flush()?;

    info!(path = %path.display(), count = answers.len(), "Analysis results saved");
    Ok(path.to_path_buf())
}
