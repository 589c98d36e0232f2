use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(
        "could not connect to any WebDriver server (tried {tried}); start one (e.g. chromedriver) or set WEBDRIVER_URL"
    )]
    Connect { tried: String },

    #[error("failed to open {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("page error: {0}")]
    Page(String),

    #[error("invalid normalization pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid page url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scan service is no longer running")]
    ServiceClosed,

    #[error("scan service answered {0} with an unexpected response")]
    UnexpectedResponse(&'static str),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
