//! Page-object base: the interaction layer.
//!
//! A `Page` owns one backend handle plus the wait policy and a soft
//! assertion collector, and exposes the uniform interaction surface that
//! concrete page objects build on. It is generic over [`Backend`] so page
//! objects run unchanged against any of the three technologies — or
//! against the scripted mock in tests.

use crate::assertion::SoftAssertions;
use crate::backend::Backend;
use crate::locator::{Locator, Rect};
use crate::result::PilotResult;
use crate::wait::WaitPolicy;
use serde_json::Value;

/// Trait for concrete page objects.
///
/// Implementors wrap a [`Page`] and expose domain-level operations
/// (`search`, `calculate_sum`, ...) built from the uniform interaction
/// surface.
pub trait PageObject {
    /// Page name for logging and reports
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Interaction-layer base for page objects
#[derive(Debug)]
pub struct Page<B: Backend> {
    handle: B,
    wait: WaitPolicy,
    soft: SoftAssertions,
}

impl<B: Backend> Page<B> {
    /// Wrap a backend handle with the given wait policy
    pub fn new(handle: B, wait: WaitPolicy) -> Self {
        Self {
            handle,
            wait,
            soft: SoftAssertions::new(),
        }
    }

    /// The wait policy applied to every interaction
    #[must_use]
    pub const fn wait_policy(&self) -> &WaitPolicy {
        &self.wait
    }

    /// Override the wait policy for subsequent interactions
    pub fn set_wait_policy(&mut self, wait: WaitPolicy) {
        self.wait = wait;
    }

    /// Soft assertion collector scoped to this page
    pub fn soft_assert(&mut self) -> &mut SoftAssertions {
        &mut self.soft
    }

    /// Direct access to the backend handle
    pub fn handle(&mut self) -> &mut B {
        &mut self.handle
    }

    /// Consume the page, returning the handle
    pub fn into_handle(self) -> B {
        self.handle
    }

    /// Navigate to a URL
    pub fn navigate(&mut self, url: &str) -> PilotResult<()> {
        self.handle.navigate(url)
    }

    /// Click an element once it is actionable
    pub fn click(&mut self, locator: &Locator) -> PilotResult<()> {
        self.handle.click(locator, &self.wait)
    }

    /// Replace an element's content with `text`
    pub fn type_text(&mut self, locator: &Locator, text: &str) -> PilotResult<()> {
        self.handle.type_text(locator, text, &self.wait)
    }

    /// Read an element's text content
    pub fn read_text(&mut self, locator: &Locator) -> PilotResult<String> {
        self.handle.read_text(locator, &self.wait)
    }

    /// Probe element visibility; never fails
    pub fn is_visible(&mut self, locator: &Locator) -> bool {
        self.handle.is_visible(locator, &self.wait)
    }

    /// Bounding rectangle of an element
    pub fn element_rect(&mut self, locator: &Locator) -> PilotResult<Rect> {
        self.handle.element_rect(locator, &self.wait)
    }

    /// Viewport/screen dimensions
    pub fn window_size(&mut self) -> PilotResult<(i64, i64)> {
        self.handle.window_size()
    }

    /// Evaluate a script in the page context
    pub fn execute_script(&mut self, script: &str) -> PilotResult<Value> {
        self.handle.execute_script(script)
    }

    /// Capture a screenshot as PNG bytes
    pub fn screenshot(&mut self) -> PilotResult<Vec<u8>> {
        self.handle.screenshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockElement};

    fn page_with(mock: MockBackend) -> Page<MockBackend> {
        Page::new(mock, WaitPolicy::new(200, 10))
    }

    #[test]
    fn test_click_and_read_flow() {
        let mut mock = MockBackend::desktop();
        let button = Locator::css("#go");
        let out = Locator::css("#out");
        mock.add_element(&button, MockElement::new("Go"));
        mock.add_element(&out, MockElement::new("idle"));
        mock.on_click_set_text(&button, &out, "running");

        let mut page = page_with(mock);
        page.click(&button).unwrap();
        assert_eq!(page.read_text(&out).unwrap(), "running");
    }

    #[test]
    fn test_type_text_replaces() {
        let mut mock = MockBackend::desktop();
        let input = Locator::name("q");
        mock.add_element(&input, MockElement::new("stale"));

        let mut page = page_with(mock);
        page.type_text(&input, "fresh").unwrap();
        assert_eq!(page.read_text(&input).unwrap(), "fresh");
    }

    #[test]
    fn test_visibility_probe_never_fails() {
        let mut page = page_with(MockBackend::desktop());
        assert!(!page.is_visible(&Locator::css("#missing")));
    }

    #[test]
    fn test_timeout_propagates_from_click() {
        let mut page = page_with(MockBackend::desktop());
        let err = page.click(&Locator::css("#missing")).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_soft_assert_scoped_to_page() {
        let mut page = page_with(MockBackend::desktop());
        page.soft_assert().assert_true(false, "probe");
        assert_eq!(page.soft_assert().failure_count(), 1);
    }

    #[test]
    fn test_wait_policy_override() {
        let mut page = page_with(MockBackend::desktop());
        page.set_wait_policy(WaitPolicy::new(50, 10));
        assert_eq!(page.wait_policy().timeout_ms, 50);
    }
}
