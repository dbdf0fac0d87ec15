//! Automation-library page behind a WebSocket bridge.
//!
//! The bridge server fronts a modern browser-automation library. Unlike the
//! wire backends there is no element resolution on this side: every call
//! ships the selector, and the remote library re-resolves it, auto-waits
//! and retries internally. A locator here is nothing but a deferred
//! selector expression.
//!
//! Requests and responses are correlated JSON frames:
//!
//! ```json
//! { "id": 7, "method": "click", "params": { "selector": "css=#go", "timeoutMs": 10000 } }
//! { "id": 7, "result": null }
//! { "id": 7, "error": { "message": "strict mode violation" } }
//! ```

use super::{Backend, BackendKind};
use crate::gesture::TouchSequence;
use crate::locator::{Locator, Rect};
use crate::result::{PilotError, PilotResult};
use crate::wait::WaitPolicy;
use base64::Engine;
use serde_json::{json, Value};
use std::net::TcpStream;
use tracing::{debug, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// A page on the automation-library bridge
pub struct BridgePage {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    next_id: u64,
    open: bool,
}

impl std::fmt::Debug for BridgePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgePage")
            .field("next_id", &self.next_id)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl BridgePage {
    /// Connect to a bridge server and open a fresh page.
    ///
    /// # Errors
    ///
    /// Transport errors from the WebSocket handshake, or a bridge error if
    /// the page cannot be created.
    pub fn connect(bridge_url: &str, headless: bool) -> PilotResult<Self> {
        let (socket, _) = tungstenite::connect(bridge_url)?;
        let mut page = Self {
            socket,
            next_id: 0,
            open: true,
        };
        page.call("newPage", json!({ "headless": headless }))?;
        debug!(bridge_url, "bridge page created");
        Ok(page)
    }

    /// One request/response round trip.
    fn call(&mut self, method: &str, params: Value) -> PilotResult<Value> {
        self.next_id += 1;
        let id = self.next_id;
        let frame = json!({ "id": id, "method": method, "params": params });
        self.socket.send(Message::Text(frame.to_string()))?;
        loop {
            let message = self.socket.read()?;
            let Message::Text(text) = message else {
                // Control frames interleave with responses
                continue;
            };
            let reply: Value = serde_json::from_str(&text)?;
            if reply.get("id").and_then(Value::as_u64) != Some(id) {
                // Stray event frame for an earlier call; drop it
                continue;
            }
            if let Some(error) = reply.get("error") {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("bridge call failed")
                    .to_string();
                return Err(if message.contains("Timeout") {
                    PilotError::Timeout {
                        ms: 0,
                        condition: message,
                    }
                } else {
                    PilotError::Wire { message }
                });
            }
            return Ok(reply.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    fn selector_call(
        &mut self,
        method: &str,
        locator: &Locator,
        wait: &WaitPolicy,
        extra: Value,
    ) -> PilotResult<Value> {
        let mut params = json!({
            "selector": locator.bridge_selector(),
            "timeoutMs": wait.timeout_ms,
        });
        if let (Some(map), Some(extra_map)) = (params.as_object_mut(), extra.as_object()) {
            for (key, value) in extra_map {
                map.insert(key.clone(), value.clone());
            }
        }
        self.call(method, params)
    }
}

impl Backend for BridgePage {
    fn kind(&self) -> BackendKind {
        BackendKind::Bridge
    }

    fn navigate(&mut self, url: &str) -> PilotResult<()> {
        debug!(url, "navigate");
        self.call("goto", json!({ "url": url })).map(|_| ())
    }

    fn click(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<()> {
        // The library resolves, waits for actionability and retries on its own
        self.selector_call("click", locator, wait, json!({}))
            .map(|_| ())
    }

    fn type_text(&mut self, locator: &Locator, text: &str, wait: &WaitPolicy) -> PilotResult<()> {
        // fill is an atomic clear+insert on the remote side
        self.selector_call("fill", locator, wait, json!({ "text": text }))
            .map(|_| ())
    }

    fn read_text(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<String> {
        let value = self.selector_call("textContent", locator, wait, json!({}))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn is_visible(&mut self, locator: &Locator, wait: &WaitPolicy) -> bool {
        self.selector_call("isVisible", locator, wait, json!({}))
            .map(|value| value.as_bool().unwrap_or(false))
            .unwrap_or(false)
    }

    fn element_rect(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<Rect> {
        let value = self.selector_call("boundingBox", locator, wait, json!({}))?;
        let field = |name: &str| value.get(name).and_then(Value::as_f64);
        match (
            field("x"),
            field("y"),
            field("width"),
            field("height"),
        ) {
            (Some(x), Some(y), Some(w), Some(h)) => {
                Ok(Rect::new(x as i64, y as i64, w as i64, h as i64))
            }
            _ => Err(PilotError::Wire {
                message: format!("malformed bounding box: {value}"),
            }),
        }
    }

    fn window_size(&mut self) -> PilotResult<(i64, i64)> {
        let value = self.call("viewportSize", json!({}))?;
        let width = value.get("width").and_then(Value::as_i64);
        let height = value.get("height").and_then(Value::as_i64);
        match (width, height) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(PilotError::Wire {
                message: format!("malformed viewport size: {value}"),
            }),
        }
    }

    fn execute_script(&mut self, script: &str) -> PilotResult<Value> {
        self.call("evaluate", json!({ "expression": script }))
            .map_err(|e| PilotError::Script {
                message: e.to_string(),
            })
    }

    fn screenshot(&mut self) -> PilotResult<Vec<u8>> {
        let value = self.call("screenshot", json!({}))?;
        let encoded = value.as_str().ok_or_else(|| PilotError::Wire {
            message: "screenshot payload was not a string".to_string(),
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| PilotError::Wire {
                message: format!("screenshot decode failed: {e}"),
            })
    }

    fn perform_touch(&mut self, _sequence: &TouchSequence) -> PilotResult<()> {
        Err(PilotError::Gesture {
            message: "bridge backend has no touch surface".to_string(),
        })
    }

    fn close(&mut self) -> PilotResult<()> {
        if self.open {
            self.open = false;
            let _ = self.call("close", json!({}));
            self.socket.close(None)?;
        }
        Ok(())
    }
}

impl Drop for BridgePage {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.close() {
                warn!(error = %e, "bridge page release failed on drop");
            }
        }
    }
}
