pub mod harvester;
pub mod orchestrator;


pub use harvester::{HarvestOutcome, HarvestStats, PopoverHarvester};
pub use orchestrator::{ScrapeOrchestrator, Variant, VariantPlan};

use crate::normalize::ImageUrl;
use crate::results::ScanResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Options for a single scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    /// Only harvest the initially selected variant
    #[serde(default)]
    pub only_main: bool,
}

/// Destination of harvested images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Images of the variant the page showed on load
    Main,
    /// Images of every other variant
    Variant,
}

impl Bucket {
    /// Bucket for the variant at `index` given the initially selected one
    pub fn for_index(index: usize, initial_index: usize) -> Self {
        if index == initial_index {
            Bucket::Main
        } else {
            Bucket::Variant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Main => "main",
            Bucket::Variant => "variant",
        }
    }
}

/// Images collected during one scan.
///
/// Owns the set of every URL attributed so far together with both buckets.
/// [`ImageLedger::record`] is the only way in, so a URL lands in at most one
/// bucket and at most once.
#[derive(Debug, Default)]
pub struct ImageLedger {
    known: HashSet<ImageUrl>,
    main: Vec<ImageUrl>,
    variant: Vec<ImageUrl>,
}

impl ImageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `url` to `bucket` unless it was already attributed.
    ///
    /// Returns whether the URL was new.
    pub fn record(&mut self, bucket: Bucket, url: ImageUrl) -> bool {
        if self.known.contains(&url) {
            ::log::trace!("Already collected: {}", url);
            return false;
        }
        self.known.insert(url.clone());
        match bucket {
            Bucket::Main => self.main.push(url),
            Bucket::Variant => self.variant.push(url),
        }
        true
    }

    pub fn count(&self, bucket: Bucket) -> usize {
        match bucket {
            Bucket::Main => self.main.len(),
            Bucket::Variant => self.variant.len(),
        }
    }

    /// Number of distinct URLs across both buckets
    pub fn total(&self) -> usize {
        self.known.len()
    }

    /// Materializes the buckets in insertion order
    pub fn into_result(self, title: String) -> ScanResult {
        ScanResult::new(self.main, self.variant, title)
    }
}

#[cfg(test)]
mod ledger_tests {
    use super::*;
    use crate::normalize::UrlNormalizer;

    fn url(raw: &str) -> ImageUrl {
        UrlNormalizer::default().normalize(raw).unwrap()
    }

    #[test]
    fn test_record_is_once_per_url_across_buckets() {
        let mut ledger = ImageLedger::new();
        assert!(ledger.record(Bucket::Main, url("https://img.example/a.jpg")));
        assert!(!ledger.record(Bucket::Variant, url("https://img.example/a.jpg")));
        assert!(!ledger.record(Bucket::Main, url("https://img.example/a.jpg")));
        assert!(ledger.record(Bucket::Variant, url("https://img.example/b.jpg")));

        assert_eq!(ledger.count(Bucket::Main), 1);
        assert_eq!(ledger.count(Bucket::Variant), 1);
        assert_eq!(ledger.total(), 2);
    }

    #[test]
    fn test_into_result_keeps_insertion_order() {
        let mut ledger = ImageLedger::new();
        ledger.record(Bucket::Variant, url("https://img.example/3.jpg"));
        ledger.record(Bucket::Variant, url("https://img.example/1.jpg"));
        ledger.record(Bucket::Main, url("https://img.example/2.jpg"));

        let result = ledger.into_result("Desk Lamp".to_string());
        assert_eq!(result.title, "Desk Lamp");
        assert_eq!(result.main_images, vec![url("https://img.example/2.jpg")]);
        assert_eq!(
            result.variant_images,
            vec![
                url("https://img.example/3.jpg"),
                url("https://img.example/1.jpg")
            ]
        );
    }

    #[test]
    fn test_bucket_for_index() {
        assert_eq!(Bucket::for_index(1, 1), Bucket::Main);
        assert_eq!(Bucket::for_index(0, 1), Bucket::Variant);
        assert_eq!(Bucket::for_index(2, 1), Bucket::Variant);
    }
}
