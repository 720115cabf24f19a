//! Statistics aggregator
//!
//! Pure, stateless summaries over a dataset. Every scan walks records in
//! dataset order so ties resolve to the first record encountered.

use crate::error::QueryError;
use crate::models::{Dataset, SectorCount, Snapshot};
use crate::Result;
use tracing::debug;

/// Compute the derived statistics snapshot for a dataset
pub fn summarize(dataset: &Dataset) -> Result<Snapshot> {
    let records = dataset.records();
    let Some(first) = records.first() else {
        return Err(QueryError::EmptyDataset);
    };

    let total = records.len();

    let mut price_sum = 0.0;
    let mut performance_sum = 0.0;
    let mut max_price = first;
    let mut max_pe: Option<(&str, f64)> = None;
    let mut sector_counts: Vec<SectorCount> = Vec::new();

    for record in records {
        price_sum += record.price;
        performance_sum += record.performance;

        if record.price > max_price.price {
            max_price = record;
        }

        if let Some(pe) = record.pe_ratio {
            if max_pe.map_or(true, |(_, best)| pe > best) {
                max_pe = Some((record.symbol.as_str(), pe));
            }
        }

        match sector_counts.iter_mut().find(|s| s.sector == record.sector) {
            Some(entry) => entry.count += 1,
            None => sector_counts.push(SectorCount {
                sector: record.sector.clone(),
                count: 1,
            }),
        }
    }

    let snapshot = Snapshot {
        total_stocks: total,
        average_price: price_sum / total as f64,
        highest_price: max_price.symbol.clone(),
        highest_pe: max_pe.map(|(symbol, _)| symbol.to_string()),
        avg_performance: performance_sum / total as f64,
        sector_counts,
    };

    debug!(
        total_stocks = snapshot.total_stocks,
        sectors = snapshot.sector_counts.len(),
        "Computed dataset snapshot"
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SecurityRecord;

    fn dataset(records: Vec<SecurityRecord>) -> Dataset {
        Dataset::new(records).unwrap()
    }

    #[test]
    fn test_empty_dataset_fails() {
        let result = summarize(&Dataset::default());
        assert!(matches!(result, Err(QueryError::EmptyDataset)));
    }

    #[test]
    fn test_basic_snapshot() {
        let ds = dataset(vec![
            SecurityRecord::new("AAPL", "Apple Inc.", 150.25, Some(28.5), 12.5, "Technology"),
            SecurityRecord::new("TSLA", "Tesla Inc.", 650.75, Some(120.5), 5.0, "Automotive"),
        ]);

        let snapshot = summarize(&ds).unwrap();
        assert_eq!(snapshot.total_stocks, 2);
        assert!((snapshot.average_price - 400.50).abs() < 1e-9);
        assert_eq!(snapshot.highest_price, "TSLA");
        assert_eq!(snapshot.highest_pe.as_deref(), Some("TSLA"));
        assert!((snapshot.avg_performance - 8.75).abs() < 1e-9);
        assert_eq!(snapshot.sector_counts.len(), 2);
    }

    #[test]
    fn test_max_price_tie_keeps_first_record() {
        let ds = dataset(vec![
            SecurityRecord::new("LOW", "Low Co", 10.0, None, 0.0, "Energy"),
            SecurityRecord::new("FIRST", "First Co", 99.0, Some(5.0), 0.0, "Energy"),
            SecurityRecord::new("SECOND", "Second Co", 99.0, Some(5.0), 0.0, "Energy"),
        ]);

        for _ in 0..3 {
            let snapshot = summarize(&ds).unwrap();
            assert_eq!(snapshot.highest_price, "FIRST");
            assert_eq!(snapshot.highest_pe.as_deref(), Some("FIRST"));
        }
    }

    #[test]
    fn test_missing_pe_is_skipped() {
        let ds = dataset(vec![
            SecurityRecord::new("RIVN", "Rivian", 12.0, None, -30.0, "Automotive"),
            SecurityRecord::new("F", "Ford", 11.0, Some(-4.0), 1.0, "Automotive"),
        ]);
        assert_eq!(summarize(&ds).unwrap().highest_pe.as_deref(), Some("F"));

        let ds = dataset(vec![SecurityRecord::new(
            "RIVN",
            "Rivian",
            12.0,
            None,
            -30.0,
            "Automotive",
        )]);
        assert_eq!(summarize(&ds).unwrap().highest_pe, None);
    }

    #[test]
    fn test_sector_histogram_first_seen_order() {
        let ds = dataset(vec![
            SecurityRecord::new("XOM", "Exxon", 100.0, None, 0.0, "Energy"),
            SecurityRecord::new("MSFT", "Microsoft", 300.0, None, 0.0, "Technology"),
            SecurityRecord::new("AAPL", "Apple", 150.0, None, 0.0, "Technology"),
            SecurityRecord::new("CVX", "Chevron", 150.0, None, 0.0, "Energy"),
        ]);

        let snapshot = summarize(&ds).unwrap();
        let order: Vec<_> = snapshot
            .sector_counts
            .iter()
            .map(|s| (s.sector.as_str(), s.count))
            .collect();
        assert_eq!(order, vec![("Energy", 2), ("Technology", 2)]);
        assert_eq!(snapshot.dominant_sector().unwrap().sector, "Energy");
    }
}
