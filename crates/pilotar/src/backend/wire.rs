//! Synchronous WebDriver wire-protocol client.
//!
//! Shared by the desktop and mobile sessions: Appium speaks the same W3C
//! wire shape as chromedriver/geckodriver, plus a handful of `appium/*`
//! extension endpoints layered on by the mobile session.

use crate::locator::{Locator, Rect};
use crate::result::{PilotError, PilotResult};
use base64::Engine;
use serde_json::{json, Value};
use std::time::Duration;

/// W3C element identifier key in wire payloads
pub(crate) const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque remote element reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ElementRef(pub String);

/// HTTP client bound to one remote session.
///
/// Until `attach_session` is called, requests address the server root
/// (only `new_session` lives there); afterwards every path is relative to
/// `/session/<id>`.
#[derive(Debug)]
pub(crate) struct WireClient {
    http: reqwest::blocking::Client,
    server_url: String,
    session_prefix: Option<String>,
}

impl WireClient {
    pub(crate) fn connect(server_url: &str) -> PilotResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
            session_prefix: None,
        })
    }

    /// Create a session with the given W3C capabilities and bind this
    /// client to it.
    pub(crate) fn new_session(&mut self, capabilities: &Value) -> PilotResult<String> {
        let body = json!({ "capabilities": { "alwaysMatch": capabilities } });
        let url = format!("{}/session", self.server_url);
        let value = self.unwrap_value(self.http.post(&url).json(&body).send()?)?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| PilotError::Session {
                message: format!("session response missing sessionId: {value}"),
            })?
            .to_string();
        self.session_prefix = Some(format!("{}/session/{}", self.server_url, session_id));
        Ok(session_id)
    }

    fn session_url(&self, path: &str) -> PilotResult<String> {
        let prefix = self.session_prefix.as_ref().ok_or_else(|| PilotError::Session {
            message: "no active session".to_string(),
        })?;
        Ok(format!("{prefix}/{path}"))
    }

    pub(crate) fn post(&self, path: &str, body: &Value) -> PilotResult<Value> {
        let url = self.session_url(path)?;
        self.unwrap_value(self.http.post(&url).json(body).send()?)
    }

    pub(crate) fn get(&self, path: &str) -> PilotResult<Value> {
        let url = self.session_url(path)?;
        self.unwrap_value(self.http.get(&url).send()?)
    }

    pub(crate) fn delete_session(&mut self) -> PilotResult<()> {
        if let Some(prefix) = self.session_prefix.take() {
            let _ = self.unwrap_value(self.http.delete(&prefix).send()?)?;
        }
        Ok(())
    }

    pub(crate) fn has_session(&self) -> bool {
        self.session_prefix.is_some()
    }

    /// Unwrap the `value` envelope, turning wire-level error objects into
    /// `PilotError`s.
    fn unwrap_value(&self, response: reqwest::blocking::Response) -> PilotResult<Value> {
        let status = response.status();
        let body: Value = response.json().unwrap_or(Value::Null);
        let value = body.get("value").cloned().unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(value);
        }
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Err(PilotError::Wire {
            message: format!("{error}: {message}"),
        })
    }

    // ------------------------------------------------------------------
    // Session-level commands
    // ------------------------------------------------------------------

    pub(crate) fn navigate(&self, url: &str) -> PilotResult<()> {
        self.post("url", &json!({ "url": url })).map(|_| ())
    }

    pub(crate) fn set_timeouts(&self, page_load_ms: u64) -> PilotResult<()> {
        self.post("timeouts", &json!({ "pageLoad": page_load_ms }))
            .map(|_| ())
    }

    pub(crate) fn window_size(&self) -> PilotResult<(i64, i64)> {
        let value = self.get("window/rect")?;
        let width = value.get("width").and_then(Value::as_i64);
        let height = value.get("height").and_then(Value::as_i64);
        match (width, height) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(PilotError::Wire {
                message: format!("malformed window rect: {value}"),
            }),
        }
    }

    pub(crate) fn execute_script(&self, script: &str) -> PilotResult<Value> {
        self.post("execute/sync", &json!({ "script": script, "args": [] }))
            .map_err(|e| PilotError::Script {
                message: e.to_string(),
            })
    }

    pub(crate) fn screenshot(&self) -> PilotResult<Vec<u8>> {
        let value = self.get("screenshot")?;
        let encoded = value.as_str().ok_or_else(|| PilotError::Wire {
            message: "screenshot payload was not a string".to_string(),
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| PilotError::Wire {
                message: format!("screenshot decode failed: {e}"),
            })
    }

    pub(crate) fn perform_actions(&self, payload: &Value) -> PilotResult<()> {
        self.post("actions", payload).map(|_| ())
    }

    // ------------------------------------------------------------------
    // Element commands
    // ------------------------------------------------------------------

    /// Locate a single element without waiting. Absence comes back as
    /// `ElementNotFound`; the wait layer decides whether to keep polling.
    pub(crate) fn find_element(&self, locator: &Locator) -> PilotResult<ElementRef> {
        let (using, value) = locator.wire_params();
        let result = self.post("element", &json!({ "using": using, "value": value }));
        match result {
            Ok(body) => body
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| ElementRef(id.to_string()))
                .ok_or_else(|| PilotError::Wire {
                    message: format!("element response missing reference: {body}"),
                }),
            Err(PilotError::Wire { message }) if message.starts_with("no such element") => {
                Err(PilotError::ElementNotFound {
                    strategy: locator.strategy.to_string(),
                    value: locator.value.clone(),
                })
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn click(&self, element: &ElementRef) -> PilotResult<()> {
        self.post(&format!("element/{}/click", element.0), &json!({}))
            .map(|_| ())
    }

    pub(crate) fn clear(&self, element: &ElementRef) -> PilotResult<()> {
        self.post(&format!("element/{}/clear", element.0), &json!({}))
            .map(|_| ())
    }

    pub(crate) fn send_keys(&self, element: &ElementRef, text: &str) -> PilotResult<()> {
        self.post(
            &format!("element/{}/value", element.0),
            &json!({ "text": text }),
        )
        .map(|_| ())
    }

    pub(crate) fn text(&self, element: &ElementRef) -> PilotResult<String> {
        let value = self.get(&format!("element/{}/text", element.0))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub(crate) fn displayed(&self, element: &ElementRef) -> PilotResult<bool> {
        let value = self.get(&format!("element/{}/displayed", element.0))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub(crate) fn enabled(&self, element: &ElementRef) -> PilotResult<bool> {
        let value = self.get(&format!("element/{}/enabled", element.0))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub(crate) fn rect(&self, element: &ElementRef) -> PilotResult<Rect> {
        let value = self.get(&format!("element/{}/rect", element.0))?;
        let field = |name: &str| value.get(name).and_then(Value::as_f64);
        match (field("x"), field("y"), field("width"), field("height")) {
            (Some(x), Some(y), Some(w), Some(h)) => {
                Ok(Rect::new(x as i64, y as i64, w as i64, h as i64))
            }
            _ => Err(PilotError::Wire {
                message: format!("malformed element rect: {value}"),
            }),
        }
    }
}
