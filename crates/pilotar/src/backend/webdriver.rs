//! Desktop browser session over the WebDriver wire protocol.
//!
//! This is the eager backend: every interaction resolves its element by
//! polling the remote end until the operation's precondition holds
//! (clickable for click, presence for type/read), then fires the primitive
//! action against the resolved reference.

use super::wire::{ElementRef, WireClient};
use super::{Backend, BackendKind};
use crate::locator::{Locator, Rect};
use crate::result::{PilotError, PilotResult};
use crate::wait::{poll_until, WaitPolicy};
use serde_json::Value;
use tracing::{debug, warn};

/// A live chromedriver/geckodriver session
#[derive(Debug)]
pub struct WebDriverSession {
    wire: WireClient,
    session_id: String,
    browser: String,
}

impl WebDriverSession {
    /// Open a session against a running WebDriver server.
    ///
    /// # Errors
    ///
    /// `PilotError::Session` when the server rejects the capabilities,
    /// transport errors otherwise.
    pub fn open(
        server_url: &str,
        browser: &str,
        capabilities: &Value,
        page_load_timeout_ms: u64,
    ) -> PilotResult<Self> {
        let mut wire = WireClient::connect(server_url)?;
        let session_id = wire.new_session(capabilities)?;
        wire.set_timeouts(page_load_timeout_ms)?;
        debug!(session_id, browser, "webdriver session created");
        Ok(Self {
            wire,
            session_id,
            browser: browser.to_string(),
        })
    }

    /// Remote session identifier
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Browser name this session was created for
    #[must_use]
    pub fn browser(&self) -> &str {
        &self.browser
    }

    /// Resolve the element once it satisfies `ready`, under the wait policy.
    fn resolve(
        &self,
        locator: &Locator,
        wait: &WaitPolicy,
        condition: &str,
        ready: impl Fn(&WireClient, &ElementRef) -> PilotResult<bool>,
    ) -> PilotResult<ElementRef> {
        let description = format!("element {locator} {condition}");
        poll_until(wait, &description, || {
            match self.wire.find_element(locator) {
                Ok(element) => match ready(&self.wire, &element) {
                    Ok(true) => Ok(Some(element)),
                    // Not ready yet, or went stale between find and probe
                    Ok(false) | Err(_) => Ok(None),
                },
                Err(PilotError::ElementNotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn resolve_present(&self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<ElementRef> {
        self.resolve(locator, wait, "present", |_, _| Ok(true))
    }
}

impl Backend for WebDriverSession {
    fn kind(&self) -> BackendKind {
        BackendKind::Desktop
    }

    fn navigate(&mut self, url: &str) -> PilotResult<()> {
        debug!(url, "navigate");
        self.wire.navigate(url)
    }

    fn click(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<()> {
        let element = self.resolve(locator, wait, "clickable", |wire, el| {
            Ok(wire.displayed(el)? && wire.enabled(el)?)
        })?;
        self.wire.click(&element)
    }

    fn type_text(&mut self, locator: &Locator, text: &str, wait: &WaitPolicy) -> PilotResult<()> {
        let element = self.resolve_present(locator, wait)?;
        self.wire.clear(&element)?;
        self.wire.send_keys(&element, text)
    }

    fn read_text(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<String> {
        let element = self.resolve_present(locator, wait)?;
        self.wire.text(&element)
    }

    fn is_visible(&mut self, locator: &Locator, wait: &WaitPolicy) -> bool {
        self.resolve(locator, wait, "visible", |wire, el| wire.displayed(el))
            .is_ok()
    }

    fn element_rect(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<Rect> {
        let element = self.resolve_present(locator, wait)?;
        self.wire.rect(&element)
    }

    fn window_size(&mut self) -> PilotResult<(i64, i64)> {
        self.wire.window_size()
    }

    fn execute_script(&mut self, script: &str) -> PilotResult<Value> {
        self.wire.execute_script(script)
    }

    fn screenshot(&mut self) -> PilotResult<Vec<u8>> {
        self.wire.screenshot()
    }

    fn close(&mut self) -> PilotResult<()> {
        self.wire.delete_session()
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.wire.has_session() {
            if let Err(e) = self.wire.delete_session() {
                warn!(session_id = %self.session_id, error = %e, "session release failed on drop");
            }
        }
    }
}
