use crate::error::{Result, ScrapeError};
use crate::page::Page;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};

/// Mouse events dispatched after the native click, for pages that listen
/// for the individual events rather than `click`.
const ACTIVATE_SCRIPT: &str = r#"
const el = arguments[0];
el.click();
['mousedown', 'mouseup', 'click'].forEach(type => {
    el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window }));
});
"#;

const ESCAPE_SCRIPT: &str = r#"
document.dispatchEvent(new KeyboardEvent('keydown', { key: 'Escape', keyCode: 27, bubbles: true }));
"#;

const MATCHES_SCRIPT: &str = "return arguments[0].matches(arguments[1]);";

/// Endpoints tried when the configured WebDriver URL does not answer
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// A live browser tab driven through WebDriver
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    /// Connects to a WebDriver server and opens `url` in a new session
    pub async fn open(webdriver_url: &str, url: &str) -> Result<Self> {
        let client = connect_to_webdriver(webdriver_url).await?;

        if let Err(e) = client.goto(url).await {
            let message = e.to_string();
            if let Err(close_err) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", close_err);
            }
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                message,
            });
        }

        ::log::info!("Opened product page: {}", url);
        Ok(Self { client })
    }

    /// Ends the WebDriver session
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }
}

/// Connects to the WebDriver instance, falling back to common local endpoints
pub async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
        }
    }

    let mut tried = vec![webdriver_url.to_string()];
    for url in FALLBACK_WEBDRIVER_URLS.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        tried.push(url.to_string());
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    Err(ScrapeError::Connect {
        tried: tried.join(", "),
    })
}

impl Page for WebDriverPage {
    type Element = Element;

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.client.find_all(Locator::Css(selector)).await?)
    }

    async fn find_all_within(&self, scope: &Element, selector: &str) -> Result<Vec<Element>> {
        Ok(scope.find_all(Locator::Css(selector)).await?)
    }

    async fn children(&self, parent: &Element, tag: &str) -> Result<Vec<Element>> {
        let xpath = format!("./{}", tag);
        Ok(parent.find_all(Locator::XPath(&xpath)).await?)
    }

    async fn matches(&self, element: &Element, selector: &str) -> Result<bool> {
        let value = self
            .run_script(MATCHES_SCRIPT, vec![serde_json::to_value(element)?, json!(selector)])
            .await?;
        value
            .as_bool()
            .ok_or_else(|| ScrapeError::Page(format!("matches({}) returned {}", selector, value)))
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attr(name).await?)
    }

    async fn text(&self, element: &Element) -> Result<String> {
        Ok(element.text().await?)
    }

    async fn image_source(&self, element: &Element) -> Result<Option<String>> {
        // The `src` property is absolute even when the attribute is relative
        match element.prop("src").await? {
            Some(src) if !src.is_empty() => Ok(Some(src)),
            _ => Ok(element.attr("src").await?),
        }
    }

    async fn activate(&self, element: &Element) -> Result<()> {
        self.run_script(ACTIVATE_SCRIPT, vec![serde_json::to_value(element)?])
            .await?;
        Ok(())
    }

    async fn press_escape(&self) -> Result<()> {
        self.run_script(ESCAPE_SCRIPT, vec![]).await?;
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    fn element_key(&self, element: &Element) -> String {
        serde_json::to_value(element)
            .map(|value| value.to_string())
            .unwrap_or_default()
    }
}
