use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a gallery scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Fixed waits between simulated actions
    #[serde(default)]
    pub timings: ScanTimings,

    /// Selector chains used to find things on the product page
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// How display URLs are turned into full-resolution URLs
    #[serde(default)]
    pub normalization: NormalizationConfig,
}

/// Named settle durations, in milliseconds.
///
/// The page gives no completion signal for any of the simulated actions, so
/// every step waits a fixed, empirically chosen time instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanTimings {
    /// Pause after variant discovery, before the first selection
    #[serde(default = "default_discovery_pause_ms")]
    pub discovery_pause_ms: u64,

    /// Wait after selecting a variant
    #[serde(default = "default_variant_settle_ms")]
    pub variant_settle_ms: u64,

    /// Wait after activating the gallery trigger
    #[serde(default = "default_popover_open_ms")]
    pub popover_open_ms: u64,

    /// Wait after the single retry of the gallery trigger
    #[serde(default = "default_popover_retry_ms")]
    pub popover_retry_ms: u64,

    /// Wait after activating a gallery thumbnail
    #[serde(default = "default_thumbnail_settle_ms")]
    pub thumbnail_settle_ms: u64,

    /// Wait after closing the gallery
    #[serde(default = "default_popover_close_ms")]
    pub popover_close_ms: u64,
}

/// CSS selectors, grouped by the step that uses them.
///
/// Lists are fallback chains: the first selector that matches wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Candidate variant-group containers
    #[serde(default = "default_variant_groups")]
    pub variant_groups: String,

    /// Thumbnail sidebar; groups inside it are not variant selectors
    #[serde(default = "default_thumbnail_region")]
    pub thumbnail_region: String,

    /// Variant items used when no group container qualifies.
    ///
    /// Unlike the other lists, every selector is queried and the results are
    /// concatenated in order, so overlapping selectors may repeat an item.
    #[serde(default = "default_fallback_variants")]
    pub fallback_variants: Vec<String>,

    /// Tag name of the variant items inside a group container
    #[serde(default = "default_variant_item_tag")]
    pub variant_item_tag: String,

    /// Marks a variant that cannot be selected
    #[serde(default = "default_unavailable")]
    pub unavailable: String,

    /// Signals that a variant is the currently selected one
    #[serde(default = "default_selected")]
    pub selected: Vec<String>,

    /// Interactive descendants of a variant, most specific first
    #[serde(default = "default_activation_targets")]
    pub activation_targets: Vec<String>,

    /// Elements that open the gallery overlay
    #[serde(default = "default_popover_triggers")]
    pub popover_triggers: Vec<String>,

    /// Large-image container of the open gallery
    #[serde(default = "default_large_image")]
    pub large_image: String,

    /// Image element inside the large-image container
    #[serde(default = "default_large_image_img")]
    pub large_image_img: String,

    /// Thumbnail controls of the open gallery
    #[serde(default = "default_thumbnails")]
    pub thumbnails: String,

    /// Marks a thumbnail that shows a video
    #[serde(default = "default_video_marker")]
    pub video_marker: String,

    /// Controls that close the gallery overlay
    #[serde(default = "default_close_controls")]
    pub close_controls: Vec<String>,
}

/// Regex replacement applied to displayed image URLs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizationConfig {
    /// Pattern matching the resolution-limiting token
    #[serde(default = "default_normalization_pattern")]
    pub pattern: String,

    /// Text that replaces the matched token
    #[serde(default = "default_normalization_replacement")]
    pub replacement: String,
}

impl ScanConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            timings: ScanTimings::default(),
            selectors: SelectorConfig::default(),
            normalization: NormalizationConfig::default(),
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanTimings {
    pub fn discovery_pause(&self) -> Duration {
        Duration::from_millis(self.discovery_pause_ms)
    }

    pub fn variant_settle(&self) -> Duration {
        Duration::from_millis(self.variant_settle_ms)
    }

    pub fn popover_open(&self) -> Duration {
        Duration::from_millis(self.popover_open_ms)
    }

    pub fn popover_retry(&self) -> Duration {
        Duration::from_millis(self.popover_retry_ms)
    }

    pub fn thumbnail_settle(&self) -> Duration {
        Duration::from_millis(self.thumbnail_settle_ms)
    }

    pub fn popover_close(&self) -> Duration {
        Duration::from_millis(self.popover_close_ms)
    }
}

impl Default for ScanTimings {
    fn default() -> Self {
        Self {
            discovery_pause_ms: default_discovery_pause_ms(),
            variant_settle_ms: default_variant_settle_ms(),
            popover_open_ms: default_popover_open_ms(),
            popover_retry_ms: default_popover_retry_ms(),
            thumbnail_settle_ms: default_thumbnail_settle_ms(),
            popover_close_ms: default_popover_close_ms(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            variant_groups: default_variant_groups(),
            thumbnail_region: default_thumbnail_region(),
            fallback_variants: default_fallback_variants(),
            variant_item_tag: default_variant_item_tag(),
            unavailable: default_unavailable(),
            selected: default_selected(),
            activation_targets: default_activation_targets(),
            popover_triggers: default_popover_triggers(),
            large_image: default_large_image(),
            large_image_img: default_large_image_img(),
            thumbnails: default_thumbnails(),
            video_marker: default_video_marker(),
            close_controls: default_close_controls(),
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            pattern: default_normalization_pattern(),
            replacement: default_normalization_replacement(),
        }
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_discovery_pause_ms() -> u64 {
    1000
}

fn default_variant_settle_ms() -> u64 {
    3000
}

fn default_popover_open_ms() -> u64 {
    2500
}

fn default_popover_retry_ms() -> u64 {
    1500
}

fn default_thumbnail_settle_ms() -> u64 {
    550
}

fn default_popover_close_ms() -> u64 {
    1200
}

fn default_variant_groups() -> String {
    r#"ul[data-action="a-button-group"]"#.to_string()
}

fn default_thumbnail_region() -> String {
    "#altImages".to_string()
}

fn default_fallback_variants() -> Vec<String> {
    vec![r#"div[id^="variation_"] li"#.to_string()]
}

fn default_variant_item_tag() -> String {
    "li".to_string()
}

fn default_unavailable() -> String {
    ".swatchUnavailable".to_string()
}

fn default_selected() -> Vec<String> {
    vec![
        ".swatchSelect".to_string(),
        ".a-button-selected".to_string(),
        r#"[aria-selected="true"]"#.to_string(),
        r#"[aria-checked="true"]"#.to_string(),
        "[checked]".to_string(),
    ]
}

fn default_activation_targets() -> Vec<String> {
    vec!["input".to_string(), "button".to_string(), "a".to_string()]
}

fn default_popover_triggers() -> Vec<String> {
    vec![
        r#"span[data-action="main-image-click"]"#.to_string(),
        "#imgTagWrapperId".to_string(),
        "#landingImage".to_string(),
    ]
}

fn default_large_image() -> String {
    "#ivLargeImage".to_string()
}

fn default_large_image_img() -> String {
    "img".to_string()
}

fn default_thumbnails() -> String {
    "#ivThumbs .ivThumb".to_string()
}

fn default_video_marker() -> String {
    ".ivVideoIcon".to_string()
}

fn default_close_controls() -> Vec<String> {
    vec![
        ".a-popover-close".to_string(),
        "#ivCloseButton".to_string(),
        r#"button[data-action="a-popover-close"]"#.to_string(),
    ]
}

fn default_normalization_pattern() -> String {
    r"\._[A-Z0-9+,_-]+_\.".to_string()
}

fn default_normalization_replacement() -> String {
    ".".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_page_timings() {
        let timings = ScanTimings::default();
        assert_eq!(timings.variant_settle(), Duration::from_millis(3000));
        assert_eq!(timings.popover_open(), Duration::from_millis(2500));
        assert_eq!(timings.popover_retry(), Duration::from_millis(1500));
        assert_eq!(timings.thumbnail_settle(), Duration::from_millis(550));
        assert_eq!(timings.popover_close(), Duration::from_millis(1200));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r##"{
            "webdriver_url": "http://localhost:9515",
            "timings": { "variant_settle_ms": 10 },
            "selectors": { "popover_triggers": ["#main-image"] }
        }"##;
        let config = ScanConfig::from_json(json).unwrap();

        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert_eq!(config.timings.variant_settle_ms, 10);
        assert_eq!(config.timings.popover_open_ms, 2500);
        assert_eq!(config.selectors.popover_triggers, vec!["#main-image"]);
        assert_eq!(config.selectors.thumbnails, "#ivThumbs .ivThumb");
        assert_eq!(config.normalization, NormalizationConfig::default());
    }

    #[test]
    fn test_empty_json_is_default_config() {
        let config = ScanConfig::from_json("{}").unwrap();
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.timings, ScanTimings::default());
        assert_eq!(config.selectors, SelectorConfig::default());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(ScanConfig::from_json("{ not json").is_err());
    }
}
