//! Web search page object.

use crate::backend::Backend;
use crate::locator::Locator;
use crate::page::{Page, PageObject};
use crate::result::PilotResult;
use crate::wait::WaitPolicy;

/// Search page: query box, submit button, result list
#[derive(Debug)]
pub struct SearchPage<B: Backend> {
    page: Page<B>,
}

impl<B: Backend> SearchPage<B> {
    /// Query input field
    #[must_use]
    pub fn search_input() -> Locator {
        Locator::name("q")
    }

    /// Submit button
    #[must_use]
    pub fn search_button() -> Locator {
        Locator::name("btnK")
    }

    /// Heading of the first search result
    #[must_use]
    pub fn first_result() -> Locator {
        Locator::css("div.g h3")
    }

    /// Wrap a backend handle
    pub fn new(handle: B, wait: WaitPolicy) -> Self {
        Self {
            page: Page::new(handle, wait),
        }
    }

    /// The underlying interaction layer
    pub fn page(&mut self) -> &mut Page<B> {
        &mut self.page
    }

    /// Consume the page, returning the handle
    pub fn into_handle(self) -> B {
        self.page.into_handle()
    }

    /// Navigate to the search page
    pub fn open(&mut self, base_url: &str) -> PilotResult<&mut Self> {
        self.page.navigate(base_url)?;
        Ok(self)
    }

    /// Type a query and submit it
    pub fn search(&mut self, query: &str) -> PilotResult<&mut Self> {
        self.page.type_text(&Self::search_input(), query)?;
        self.page.click(&Self::search_button())?;
        Ok(self)
    }

    /// Whether any result is showing
    pub fn results_visible(&mut self) -> bool {
        self.page.is_visible(&Self::first_result())
    }

    /// Text of the first result heading
    pub fn first_result_text(&mut self) -> PilotResult<String> {
        self.page.read_text(&Self::first_result())
    }
}

impl<B: Backend> PageObject for SearchPage<B> {
    fn page_name(&self) -> &str {
        "SearchPage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockElement};

    fn scripted_search() -> SearchPage<MockBackend> {
        let mut mock = MockBackend::desktop();
        mock.add_element(&SearchPage::<MockBackend>::search_input(), MockElement::new(""));
        mock.add_element(&SearchPage::<MockBackend>::search_button(), MockElement::new("Search"));
        mock.add_element(
            &SearchPage::<MockBackend>::first_result(),
            MockElement::new("").hidden(),
        );
        SearchPage::new(mock, WaitPolicy::new(300, 10))
    }

    #[test]
    fn test_search_types_then_clicks() {
        let mut page = scripted_search();
        page.open("https://www.example.com").unwrap();
        page.search("pilotar").unwrap();

        let mock = page.page().handle();
        assert_eq!(mock.navigations, vec!["https://www.example.com"]);
        assert_eq!(mock.typed.get("name:q").unwrap(), "pilotar");
        assert!(mock.calls.iter().any(|c| c.starts_with("click:name:btnK")));
    }

    #[test]
    fn test_results_probe_is_total() {
        let mut page = scripted_search();
        // Hidden result renders the probe false, not an error
        assert!(!page.results_visible());
    }
}
