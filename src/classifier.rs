//! Intent Classifier
//!
//! Maps a free-text question onto a closed set of intents using an ordered
//! rule table. The first rule whose predicate holds wins; there is no scoring.
//!
//! Ticker symbols are matched by exact case against the dataset's symbol set.
//! Topic keywords are matched case-insensitively.

use crate::models::Dataset;
use std::fmt;

/// What a question is asking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    PriceLookup(String),
    PerformanceLookup(String),
    RatioLookup(String),
    MaxPriceLookup,
    AveragePriceLookup,
    DominantSectorLookup,
    Unclassified,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::PriceLookup(s) => write!(f, "price_lookup({})", s),
            Intent::PerformanceLookup(s) => write!(f, "performance_lookup({})", s),
            Intent::RatioLookup(s) => write!(f, "ratio_lookup({})", s),
            Intent::MaxPriceLookup => write!(f, "max_price_lookup"),
            Intent::AveragePriceLookup => write!(f, "average_price_lookup"),
            Intent::DominantSectorLookup => write!(f, "dominant_sector_lookup"),
            Intent::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Pre-computed view of a query shared by every rule
#[derive(Debug)]
pub struct QueryFeatures<'a> {
    lowered: String,
    /// Known symbol occurring earliest in the query
    symbol: Option<&'a str>,
}

impl<'a> QueryFeatures<'a> {
    pub fn extract(query: &str, dataset: &'a Dataset) -> Self {
        Self {
            lowered: query.to_lowercase(),
            symbol: find_symbol(query, dataset),
        }
    }

    pub fn symbol(&self) -> Option<&'a str> {
        self.symbol
    }

    fn has(&self, keyword: &str) -> bool {
        self.lowered.contains(keyword)
    }

    fn has_word(&self, word: &str) -> bool {
        find_bounded(&self.lowered, word, |c| !c.is_alphanumeric()).is_some()
    }
}

/// Earliest exact-case occurrence of a known symbol; the longer symbol wins
/// when two start at the same position (BRK vs BRK.B).
fn find_symbol<'a>(query: &str, dataset: &'a Dataset) -> Option<&'a str> {
    dataset
        .symbols()
        .filter(|s| !s.is_empty())
        .filter_map(|s| find_bounded(query, s, is_symbol_boundary).map(|pos| (pos, s)))
        .min_by(|(pa, a), (pb, b)| pa.cmp(pb).then(b.len().cmp(&a.len())))
        .map(|(_, s)| s)
}

/// `/` is not a boundary so the `E` of `P/E` never reads as a ticker
fn is_symbol_boundary(c: char) -> bool {
    !c.is_alphanumeric() && c != '/'
}

/// Byte offset of the first occurrence of `needle` whose neighbouring
/// characters (if any) satisfy `is_boundary`
fn find_bounded(haystack: &str, needle: &str, is_boundary: fn(char) -> bool) -> Option<usize> {
    haystack.match_indices(needle).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + needle.len()..].chars().next();
        before.map_or(true, is_boundary) && after.map_or(true, is_boundary)
    })
}

/// One (predicate, constructor) pair in the rule table
pub struct IntentRule {
    pub name: &'static str,
    pub predicate: fn(&QueryFeatures) -> bool,
    pub build: fn(&QueryFeatures) -> Option<Intent>,
}

fn mentions_ratio(f: &QueryFeatures) -> bool {
    f.has_word("pe") || f.has("p/e")
}

/// Static rule table, highest priority first
const RULES: &[IntentRule] = &[
    IntentRule {
        name: "symbol_price",
        predicate: |f| f.symbol.is_some() && f.has("price"),
        build: |f| f.symbol().map(|s| Intent::PriceLookup(s.to_string())),
    },
    IntentRule {
        name: "symbol_performance",
        predicate: |f| f.symbol.is_some() && f.has("performance"),
        build: |f| f.symbol().map(|s| Intent::PerformanceLookup(s.to_string())),
    },
    IntentRule {
        name: "symbol_pe_ratio",
        predicate: |f| f.symbol.is_some() && mentions_ratio(f),
        build: |f| f.symbol().map(|s| Intent::RatioLookup(s.to_string())),
    },
    IntentRule {
        name: "highest_price",
        predicate: |f| f.has("highest price"),
        build: |_| Some(Intent::MaxPriceLookup),
    },
    IntentRule {
        name: "average_price",
        predicate: |f| f.has("average") && f.has("price"),
        build: |_| Some(Intent::AveragePriceLookup),
    },
    IntentRule {
        name: "dominant_sector",
        predicate: |f| f.has("sector") && f.has("most"),
        build: |_| Some(Intent::DominantSectorLookup),
    },
];

/// Intent classifier
pub struct IntentClassifier;

impl IntentClassifier {
    /// Classify a question against the symbols of `dataset`
    pub fn classify(query: &str, dataset: &Dataset) -> Intent {
        let features = QueryFeatures::extract(query, dataset);

        RULES
            .iter()
            .filter(|rule| (rule.predicate)(&features))
            .find_map(|rule| (rule.build)(&features))
            .unwrap_or(Intent::Unclassified)
    }

    /// Rule names in evaluation order
    pub fn rule_names() -> Vec<&'static str> {
        RULES.iter().map(|r| r.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SecurityRecord;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            SecurityRecord::new("AAPL", "Apple Inc.", 150.25, Some(28.5), 12.5, "Technology"),
            SecurityRecord::new("TSLA", "Tesla Inc.", 650.75, Some(120.5), 5.0, "Automotive"),
            SecurityRecord::new("MSFT", "Microsoft", 310.0, Some(35.6), 8.0, "Technology"),
            SecurityRecord::new("BRK.B", "Berkshire Hathaway", 350.0, Some(9.1), 3.0, "Financial"),
        ])
        .unwrap()
    }

    #[test]
    fn test_symbol_rules() {
        let ds = dataset();
        let cases = vec![
            ("What is the stock price of AAPL?", Intent::PriceLookup("AAPL".into())),
            ("What is the performance of TSLA?", Intent::PerformanceLookup("TSLA".into())),
            ("What is the PE ratio of MSFT?", Intent::RatioLookup("MSFT".into())),
            ("MSFT p/e please", Intent::RatioLookup("MSFT".into())),
            ("price of BRK.B.", Intent::PriceLookup("BRK.B".into())),
        ];

        for (query, expected) in cases {
            assert_eq!(IntentClassifier::classify(query, &ds), expected, "query: {}", query);
        }
    }

    #[test]
    fn test_aggregate_rules() {
        let ds = dataset();
        assert_eq!(
            IntentClassifier::classify("Which stock has the highest price?", &ds),
            Intent::MaxPriceLookup
        );
        assert_eq!(
            IntentClassifier::classify("What is the AVERAGE stock PRICE?", &ds),
            Intent::AveragePriceLookup
        );
        assert_eq!(
            IntentClassifier::classify("Which sector has the most stocks?", &ds),
            Intent::DominantSectorLookup
        );
    }

    #[test]
    fn test_symbol_and_price_beats_highest_price() {
        let ds = dataset();
        assert_eq!(
            IntentClassifier::classify("What is the highest price of AAPL?", &ds),
            Intent::PriceLookup("AAPL".into())
        );
    }

    #[test]
    fn test_unknown_symbol_shape_is_not_a_symbol() {
        let ds = dataset();
        // AMZN looks like a ticker but is not in the dataset
        assert_eq!(
            IntentClassifier::classify("What is the market cap of AMZN?", &ds),
            Intent::Unclassified
        );
        assert_eq!(
            IntentClassifier::classify("What is the price of AMZN?", &ds),
            Intent::Unclassified
        );
    }

    #[test]
    fn test_symbol_requires_exact_case() {
        let ds = dataset();
        assert_eq!(
            IntentClassifier::classify("what is the price of aapl?", &ds),
            Intent::Unclassified
        );
    }

    #[test]
    fn test_pe_not_matched_inside_words() {
        let ds = dataset();
        // "specific" and "open" contain "pe" but are not the ratio keyword
        assert_eq!(
            IntentClassifier::classify("Is MSFT open for specific trading?", &ds),
            Intent::Unclassified
        );
    }

    #[test]
    fn test_symbols_with_punctuation() {
        let ds = Dataset::new(vec![
            SecurityRecord::new("^GSPC", "S&P 500", 5000.0, None, 10.0, "Index"),
            SecurityRecord::new("GC=F", "Gold Futures", 2300.0, None, 4.0, "Commodity"),
            SecurityRecord::new("BF_B", "Brown-Forman", 45.0, Some(20.0), -3.0, "Beverages"),
        ])
        .unwrap();

        let cases = vec![
            ("What is the price of ^GSPC?", Intent::PriceLookup("^GSPC".into())),
            ("What is the price of GC=F?", Intent::PriceLookup("GC=F".into())),
            ("What is the price of BF_B?", Intent::PriceLookup("BF_B".into())),
            ("What is the PE-ratio of BF_B?", Intent::RatioLookup("BF_B".into())),
        ];

        for (query, expected) in cases {
            assert_eq!(IntentClassifier::classify(query, &ds), expected, "query: {}", query);
        }
    }

    #[test]
    fn test_earliest_and_longest_symbol_wins() {
        let ds = Dataset::new(vec![
            SecurityRecord::new("E", "Eni", 30.0, Some(7.0), 1.0, "Energy"),
            SecurityRecord::new("BRK", "Berkshire", 500_000.0, None, 2.0, "Financial"),
            SecurityRecord::new("BRK.B", "Berkshire B", 350.0, None, 2.0, "Financial"),
            SecurityRecord::new("MSFT", "Microsoft", 310.0, Some(35.6), 8.0, "Technology"),
        ])
        .unwrap();

        // the E of P/E is not a ticker
        assert_eq!(
            IntentClassifier::classify("What is the P/E ratio of MSFT?", &ds),
            Intent::RatioLookup("MSFT".into())
        );
        assert_eq!(
            IntentClassifier::classify("Price of BRK.B vs MSFT", &ds),
            Intent::PriceLookup("BRK.B".into())
        );
        assert_eq!(
            IntentClassifier::classify("Price of MSFT vs BRK", &ds),
            Intent::PriceLookup("MSFT".into())
        );
        assert_eq!(
            IntentClassifier::classify("What is the PE of E?", &ds),
            Intent::RatioLookup("E".into())
        );
    }

    #[test]
    fn test_edge_cases() {
        let ds = dataset();
        assert_eq!(IntentClassifier::classify("", &ds), Intent::Unclassified);
        assert_eq!(IntentClassifier::classify("hi", &ds), Intent::Unclassified);
        assert_eq!(
            IntentClassifier::classify("Which technology stock has the lowest P/E ratio?", &ds),
            Intent::Unclassified
        );
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            IntentClassifier::rule_names(),
            vec![
                "symbol_price",
                "symbol_performance",
                "symbol_pe_ratio",
                "highest_price",
                "average_price",
                "dominant_sector",
            ]
        );
    }
}
