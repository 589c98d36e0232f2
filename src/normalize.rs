use crate::config::NormalizationConfig;
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A full-resolution image address, as produced by [`UrlNormalizer`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageUrl(String);

impl ImageUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strips the resolution-limiting token that image hosts embed in display URLs.
///
/// With the default pattern `https://host/I/abc._AC_SX679_.jpg` becomes
/// `https://host/I/abc.jpg`. The replacement is repeated until nothing
/// matches, so normalizing an already normalized URL is a no-op.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    pattern: Regex,
    replacement: String,
}

impl UrlNormalizer {
    pub fn new(config: &NormalizationConfig) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(&config.pattern)?,
            replacement: config.replacement.clone(),
        })
    }

    /// Normalizes a displayed image URL; blank input yields `None`
    pub fn normalize(&self, raw: &str) -> Option<ImageUrl> {
        let mut url = raw.trim().to_string();
        if url.is_empty() {
            return None;
        }

        // The first replacement always applies; later passes only while they
        // shrink the URL
        if let Some(next) = self.replace_first(&url) {
            url = next;
        }
        while let Some(next) = self.replace_first(&url) {
            if next.len() >= url.len() {
                break;
            }
            url = next;
        }

        if url.is_empty() {
            None
        } else {
            Some(ImageUrl(url))
        }
    }

    fn replace_first(&self, url: &str) -> Option<String> {
        let token = self.pattern.find(url)?;
        Some(format!(
            "{}{}{}",
            &url[..token.start()],
            self.replacement,
            &url[token.end()..]
        ))
    }
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self {
            pattern: Regex::new(r"\._[A-Z0-9+,_-]+_\.").expect("default pattern is valid"),
            replacement: ".".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_resolution_token() {
        let normalizer = UrlNormalizer::default();
        let url = normalizer
            .normalize("https://m.media-amazon.com/images/I/71abcDEF._AC_SX679_.jpg")
            .unwrap();
        assert_eq!(url.as_str(), "https://m.media-amazon.com/images/I/71abcDEF.jpg");
    }

    #[test]
    fn test_tokens_with_punctuation() {
        let normalizer = UrlNormalizer::default();
        let url = normalizer
            .normalize("https://img.example/I/x._SX38_SY50_CR,0,0,38,50_.jpg")
            .unwrap();
        assert_eq!(url.as_str(), "https://img.example/I/x.jpg");
    }

    #[test]
    fn test_urls_differing_only_in_token_collapse() {
        let normalizer = UrlNormalizer::default();
        let a = normalizer.normalize("https://img.example/I/p._AC_SL1500_.jpg");
        let b = normalizer.normalize("https://img.example/I/p._SX300_SY300_QL70_.jpg");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let normalizer = UrlNormalizer::default();
        let inputs = [
            "https://img.example/I/p._AC_SL1500_.jpg",
            "https://img.example/I/p._AC_._SX40_.jpg",
            "https://img.example/I/plain.jpg",
            "https://img.example/I/lower._ac_sl1500_.jpg",
        ];
        for input in inputs {
            let once = normalizer.normalize(input).unwrap();
            let twice = normalizer.normalize(once.as_str()).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_stacked_tokens_are_all_removed() {
        let normalizer = UrlNormalizer::default();
        let url = normalizer
            .normalize("https://img.example/I/p._AC_._SX40_.jpg")
            .unwrap();
        assert_eq!(url.as_str(), "https://img.example/I/p.jpg");
    }

    #[test]
    fn test_blank_input_is_none() {
        let normalizer = UrlNormalizer::default();
        assert!(normalizer.normalize("").is_none());
        assert!(normalizer.normalize("   ").is_none());
    }

    #[test]
    fn test_custom_pattern() {
        let config = NormalizationConfig {
            pattern: r"\?w=\d+".to_string(),
            replacement: String::new(),
        };
        let normalizer = UrlNormalizer::new(&config).unwrap();
        let url = normalizer
            .normalize("https://cdn.example/shoe.png?w=200")
            .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/shoe.png");
    }

    #[test]
    fn test_growing_replacement_applies_once() {
        let config = NormalizationConfig {
            pattern: r"\.jpg$".to_string(),
            replacement: "_big.jpg".to_string(),
        };
        let normalizer = UrlNormalizer::new(&config).unwrap();
        let url = normalizer.normalize("https://cdn.example/a.jpg").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/a_big.jpg");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let config = NormalizationConfig {
            pattern: "(".to_string(),
            replacement: ".".to_string(),
        };
        assert!(UrlNormalizer::new(&config).is_err());
    }
}
