//! Core data models for the stock query engine

use crate::error::QueryError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

//
// ================= Security =================
//

/// One row of the stock table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRecord {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    /// Missing for loss-making companies
    pub pe_ratio: Option<f64>,
    /// Signed percentage, e.g. `12.5` for +12.5%
    pub performance: f64,
    pub sector: String,
}

impl SecurityRecord {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        pe_ratio: Option<f64>,
        performance: f64,
        sector: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            price,
            pe_ratio,
            performance,
            sector: sector.into(),
        }
    }
}

//
// ================= Dataset =================
//

/// Ordered, symbol-unique collection of securities.
///
/// Iteration order is the ingestion order and drives every tie-break
/// in the statistics layer.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SecurityRecord>,
    by_symbol: HashMap<String, usize>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate symbols.
    pub fn new(records: Vec<SecurityRecord>) -> Result<Self> {
        let mut by_symbol = HashMap::with_capacity(records.len());

        for (idx, record) in records.iter().enumerate() {
            if by_symbol.insert(record.symbol.clone(), idx).is_some() {
                return Err(QueryError::DuplicateSymbol(record.symbol.clone()));
            }
        }

        Ok(Self { records, by_symbol })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SecurityRecord] {
        &self.records
    }

    /// Exact-case symbol lookup
    pub fn get(&self, symbol: &str) -> Option<&SecurityRecord> {
        self.by_symbol.get(symbol).map(|&idx| &self.records[idx])
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.symbol.as_str())
    }

    /// Records matching a filter, in dataset order
    pub fn filter(&self, filter: &DatasetFilter) -> Vec<&SecurityRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Render the dataset as CSV with the ingestion headers.
    ///
    /// This is the handle the reasoning agent receives.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;

        for r in &self.records {
            writer.write_record([
                r.symbol.clone(),
                r.name.clone(),
                r.price.to_string(),
                r.pe_ratio.map(|pe| pe.to_string()).unwrap_or_default(),
                r.performance.to_string(),
                r.sector.clone(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| QueryError::IoError(e.into_error()))?;

        String::from_utf8(bytes)
            .map_err(|e| QueryError::InvalidRecord { line: 0, message: e.to_string() })
    }
}

/// Column headers of the stock CSV
pub const CSV_HEADERS: [&str; 6] = [
    "Stock Symbol",
    "Stock Name",
    "Price",
    "P/E Ratio",
    "Performance (%)",
    "Sector",
];

/// Sector + inclusive price band filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetFilter {
    pub sector: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl DatasetFilter {
    pub fn matches(&self, record: &SecurityRecord) -> bool {
        if let Some(sector) = &self.sector {
            if &record.sector != sector {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| record.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| record.price > max) {
            return false;
        }
        true
    }
}

//
// ================= Statistics =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCount {
    pub sector: String,
    pub count: usize,
}

/// Derived statistics computed from a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub total_stocks: usize,
    pub average_price: f64,
    /// Symbol of the first record holding the maximum price
    pub highest_price: String,
    /// Symbol of the first record holding the maximum P/E, if any record has one
    pub highest_pe: Option<String>,
    pub avg_performance: f64,
    /// Histogram in first-seen order
    pub sector_counts: Vec<SectorCount>,
}

impl Snapshot {
    /// Sector with the most members; first-seen wins on ties.
    pub fn dominant_sector(&self) -> Option<&SectorCount> {
        let mut best: Option<&SectorCount> = None;
        for entry in &self.sector_counts {
            if best.map_or(true, |b| entry.count > b.count) {
                best = Some(entry);
            }
        }
        best
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total_stocks: {}", self.total_stocks)?;
        writeln!(f, "average_price: {:.2}", self.average_price)?;
        writeln!(f, "highest_price: {}", self.highest_price)?;
        writeln!(
            f,
            "highest_pe: {}",
            self.highest_pe.as_deref().unwrap_or("n/a")
        )?;
        writeln!(f, "avg_performance: {:.2}", self.avg_performance)?;
        write!(f, "sectors:")?;
        for entry in &self.sector_counts {
            write!(f, " {}={}", entry.sector, entry.count)?;
        }
        Ok(())
    }
}

//
// ================= Answer =================
//

/// Textual result of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub query: String,
    pub response: String,
}

impl Answer {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }
}
