use crate::normalize::ImageUrl;
use crate::scan::{Bucket, HarvestOutcome};
use serde::{Deserialize, Serialize};

/// Images found by a completed scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Images of the initially selected variant
    pub main_images: Vec<ImageUrl>,

    /// Images of all other variants
    pub variant_images: Vec<ImageUrl>,

    /// Title of the page when the scan finished
    pub title: String,
}

impl ScanResult {
    pub fn new(main_images: Vec<ImageUrl>, variant_images: Vec<ImageUrl>, title: String) -> Self {
        Self {
            main_images,
            variant_images,
            title,
        }
    }

    pub fn images(&self, bucket: Bucket) -> &[ImageUrl] {
        match bucket {
            Bucket::Main => &self.main_images,
            Bucket::Variant => &self.variant_images,
        }
    }

    pub fn total_images(&self) -> usize {
        self.main_images.len() + self.variant_images.len()
    }
}

/// Progress of a running scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanProgress {
    /// Variants were enumerated; `count` is zero when the page has none
    VariantsDiscovered { count: usize, initial_index: usize },

    VariantStarted {
        index: usize,
        total: usize,
        label: String,
    },

    /// Passed over because only the main variant was requested
    VariantSkipped { index: usize },

    VariantHarvested {
        index: usize,
        bucket: Bucket,
        outcome: HarvestOutcome,
        main_count: usize,
        variant_count: usize,
    },

    Completed {
        main_count: usize,
        variant_count: usize,
    },
}
