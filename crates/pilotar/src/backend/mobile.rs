//! Mobile device session over the Appium protocol.
//!
//! Appium reuses the WebDriver wire shape, so this session shares the wire
//! client with the desktop backend and layers the mobile surface on top:
//! W3C pointer actions carrying multi-contact touch sequences, the
//! `appium/*` device endpoints, and screen recording.

use super::wire::WireClient;
use super::{Backend, BackendKind};
use crate::gesture::TouchSequence;
use crate::locator::{Locator, Rect};
use crate::result::{PilotError, PilotResult};
use crate::wait::{poll_until_found, WaitPolicy};
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// A live Appium session bound to one device
#[derive(Debug)]
pub struct MobileSession {
    wire: WireClient,
    session_id: String,
    platform: String,
    recording: bool,
}

impl MobileSession {
    /// Open a session against a running Appium server.
    ///
    /// # Errors
    ///
    /// `PilotError::Session` when the server rejects the capabilities,
    /// transport errors otherwise.
    pub fn open(hub_url: &str, platform: &str, capabilities: &Value) -> PilotResult<Self> {
        let mut wire = WireClient::connect(hub_url)?;
        let session_id = wire.new_session(capabilities)?;
        debug!(session_id, platform, "appium session created");
        Ok(Self {
            wire,
            session_id,
            platform: platform.to_string(),
            recording: false,
        })
    }

    /// Remote session identifier
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Target platform name (android/ios)
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Dismiss the on-screen keyboard if one is showing. A probe — a
    /// keyboard that is not up is not an error.
    pub fn hide_keyboard(&mut self) {
        if let Err(e) = self.wire.post("appium/device/hide_keyboard", &json!({})) {
            debug!(error = %e, "hide_keyboard probe failed");
        }
    }
}

impl Backend for MobileSession {
    fn kind(&self) -> BackendKind {
        BackendKind::Mobile
    }

    fn navigate(&mut self, url: &str) -> PilotResult<()> {
        // Meaningful for mobile-web contexts; native apps ignore it
        debug!(url, "navigate");
        self.wire.navigate(url)
    }

    fn click(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<()> {
        let condition = format!("element {locator} present");
        let element = poll_until_found(wait, &condition, || self.wire.find_element(locator))?;
        self.wire.click(&element)
    }

    fn type_text(&mut self, locator: &Locator, text: &str, wait: &WaitPolicy) -> PilotResult<()> {
        let condition = format!("element {locator} present");
        let element = poll_until_found(wait, &condition, || self.wire.find_element(locator))?;
        self.wire.clear(&element)?;
        self.wire.send_keys(&element, text)
    }

    fn read_text(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<String> {
        let condition = format!("element {locator} present");
        let element = poll_until_found(wait, &condition, || self.wire.find_element(locator))?;
        self.wire.text(&element)
    }

    fn is_visible(&mut self, locator: &Locator, wait: &WaitPolicy) -> bool {
        let condition = format!("element {locator} visible");
        poll_until_found(wait, &condition, || {
            let element = self.wire.find_element(locator)?;
            if self.wire.displayed(&element)? {
                Ok(())
            } else {
                Err(PilotError::ElementNotFound {
                    strategy: locator.strategy.to_string(),
                    value: locator.value.clone(),
                })
            }
        })
        .is_ok()
    }

    fn element_rect(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<Rect> {
        let condition = format!("element {locator} present");
        let element = poll_until_found(wait, &condition, || self.wire.find_element(locator))?;
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

    fn perform_touch(&mut self, sequence: &TouchSequence) -> PilotResult<()> {
        if sequence.is_empty() {
            return Ok(());
        }
        // The server replays the whole sequence before responding, so the
        // calling thread blocks for the gesture's wall-clock duration.
        self.wire.perform_actions(&sequence.to_w3c())
    }

    fn start_recording(&mut self) -> PilotResult<()> {
        self.wire
            .post("appium/start_recording_screen", &json!({}))
            .map_err(|e| PilotError::Recording {
                message: e.to_string(),
            })?;
        self.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self) -> PilotResult<Vec<u8>> {
        let value = self
            .wire
            .post("appium/stop_recording_screen", &json!({}))
            .map_err(|e| PilotError::Recording {
                message: e.to_string(),
            })?;
        self.recording = false;
        let encoded = value.as_str().ok_or_else(|| PilotError::Recording {
            message: "recording payload was not a string".to_string(),
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| PilotError::Recording {
                message: format!("recording decode failed: {e}"),
            })
    }

    fn close(&mut self) -> PilotResult<()> {
        if self.recording {
            // Orphaned recordings pin device storage; drain before quitting
            let _ = self.stop_recording();
        }
        self.wire.delete_session()
    }
}

impl Drop for MobileSession {
    fn drop(&mut self) {
        if self.wire.has_session() {
            if let Err(e) = self.close() {
                warn!(session_id = %self.session_id, error = %e, "session release failed on drop");
            }
        }
    }
}
