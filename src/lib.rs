pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod page;
pub mod results;
pub mod scan;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use error::{Result, ScrapeError};
pub use normalize::ImageUrl;
pub use results::{ScanProgress, ScanResult};
pub use scan::ScanOptions;

use config::ScanConfig;
use page::webdriver::WebDriverPage;
use session::ScanService;
use tokio::sync::mpsc;
use url::Url;

/// Main builder for scanning a product page in a WebDriver-controlled browser
pub struct Scanner {
    url: String,
    config: ScanConfig,
    options: ScanOptions,
}

impl Scanner {
    /// Create a new Scanner for the given product page URL
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            config: ScanConfig::default(),
            options: ScanOptions::default(),
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = ScanConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self> {
        let config = ScanConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Only harvest the variant the page shows on load
    pub fn with_only_main(mut self, only_main: bool) -> Self {
        self.options.only_main = only_main;
        self
    }

    /// Override the WebDriver URL
    pub fn with_webdriver_url(mut self, webdriver_url: &str) -> Self {
        self.config.webdriver_url = webdriver_url.to_string();
        self
    }

    /// Open the page, run one scan and close the browser session.
    ///
    /// Progress events are sent on `progress` while the scan runs; the
    /// receiver must be drained concurrently or dropped.
    pub async fn run(self, progress: Option<mpsc::Sender<ScanProgress>>) -> Result<ScanResult> {
        let url = Url::parse(&self.url)?;
        let mut config = self.config;

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.webdriver_url = webdriver_url;
            }
        }

        ::log::info!("Scanning {} via {}", url, config.webdriver_url);
        let page = WebDriverPage::open(&config.webdriver_url, url.as_str()).await?;

        let mut service = ScanService::new(page, config);
        if let Some(progress) = progress {
            service = service.with_progress(progress);
        }

        let (client, requests) = session::channel(4);
        let options = self.options;
        let (page, result) = tokio::join!(service.serve(requests), async move {
            client.ping().await?;
            let result = client.run_scan(options).await?;
            Ok::<_, ScrapeError>(result)
        });

        if let Err(e) = page.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }

        result
    }
}
