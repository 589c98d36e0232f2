pub mod webdriver;

use crate::error::Result;

/// The product page as the scan sees it: an uncontrolled document that can be
/// queried with CSS selectors and poked with simulated user input.
///
/// Any element may be missing at any time. Implementations report lookup
/// misses as empty results and reserve errors for a broken backend.
#[allow(async_fn_in_trait)]
pub trait Page {
    /// Handle to an element of the document
    type Element: Clone;

    /// All elements matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// All descendants of `scope` matching `selector`, in document order
    async fn find_all_within(
        &self,
        scope: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>>;

    /// Direct children of `parent` with the given tag name
    async fn children(&self, parent: &Self::Element, tag: &str) -> Result<Vec<Self::Element>>;

    /// Whether `element` itself matches `selector`
    async fn matches(&self, element: &Self::Element, selector: &str) -> Result<bool>;

    async fn attr(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// Rendered text of `element`
    async fn text(&self, element: &Self::Element) -> Result<String>;

    /// Resolved source URL of an image element
    async fn image_source(&self, element: &Self::Element) -> Result<Option<String>>;

    /// Simulates a user click on `element`
    async fn activate(&self, element: &Self::Element) -> Result<()>;

    /// Sends an Escape key press to the document
    async fn press_escape(&self) -> Result<()>;

    async fn title(&self) -> Result<String>;

    /// Identity of an element, equal for two handles to the same node
    fn element_key(&self, element: &Self::Element) -> String;
}

/// Returns the first element found by a priority-ordered list of selectors.
///
/// With `scope` set, only descendants of that element are searched. Lookup
/// errors count as misses so a broken selector never hides a later one.
pub async fn resolve<P: Page>(
    page: &P,
    scope: Option<&P::Element>,
    selectors: &[String],
) -> Option<P::Element> {
    for selector in selectors {
        let found = match scope {
            Some(scope) => page.find_all_within(scope, selector).await,
            None => page.find_all(selector).await,
        };
        match found {
            Ok(elements) => {
                if let Some(element) = elements.into_iter().next() {
                    ::log::trace!("Resolved element with selector: {}", selector);
                    return Some(element);
                }
            }
            Err(e) => {
                ::log::debug!("Lookup failed for selector {}: {}", selector, e);
            }
        }
    }
    None
}

/// Whether `element` or one of its descendants matches any of `selectors`
pub async fn carries_any<P: Page>(page: &P, element: &P::Element, selectors: &[String]) -> bool {
    for selector in selectors {
        if page.matches(element, selector).await.unwrap_or(false) {
            return true;
        }
        if let Ok(found) = page.find_all_within(element, selector).await {
            if !found.is_empty() {
                return true;
            }
        }
    }
    false
}
