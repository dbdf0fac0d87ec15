//! Scriptable in-memory backend for unit and scenario tests.
//!
//! The mock honors the same synchronization contract as the wire backends:
//! eager operations poll under the caller's wait policy, so tests exercise
//! the real timing machinery against scripted element behavior (elements
//! that appear late, stay hidden, or change text when something is
//! clicked).

use super::{Backend, BackendKind};
use crate::gesture::TouchSequence;
use crate::locator::{Locator, Rect};
use crate::result::{PilotError, PilotResult};
use crate::wait::{poll_until, WaitPolicy};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A scripted element in the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Current text content
    pub text: String,
    /// Whether the element is rendered
    pub displayed: bool,
    /// Whether the element accepts interaction
    pub enabled: bool,
    /// Bounding rectangle reported to gesture code
    pub rect: Rect,
    /// Element only materializes after this long
    pub appears_after: Duration,
    /// Element only materializes after this many touch sequences (scrolling)
    pub appears_after_touches: usize,
}

impl MockElement {
    /// Visible, enabled element with the given text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            displayed: true,
            enabled: true,
            rect: Rect::new(0, 0, 100, 50),
            appears_after: Duration::ZERO,
            appears_after_touches: 0,
        }
    }

    /// Mark the element as present but not rendered
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Mark the element as rendered but inert
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Element materializes only after `ms` milliseconds
    #[must_use]
    pub fn appears_after_ms(mut self, ms: u64) -> Self {
        self.appears_after = Duration::from_millis(ms);
        self
    }

    /// Element materializes only after `count` touch sequences
    #[must_use]
    pub fn appears_after_touches(mut self, count: usize) -> Self {
        self.appears_after_touches = count;
        self
    }

    /// Set the bounding rectangle
    #[must_use]
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }
}

/// Text rewrite applied when a given element is clicked
#[derive(Debug, Clone)]
struct ClickEffect {
    clicked: String,
    target: String,
    new_text: String,
}

/// Scriptable backend double
#[derive(Debug)]
pub struct MockBackend {
    kind: BackendKind,
    created: Instant,
    elements: HashMap<String, MockElement>,
    click_effects: Vec<ClickEffect>,
    window: (i64, i64),
    script_result: Value,
    screenshot_bytes: Vec<u8>,
    recording_bytes: Vec<u8>,
    recording: bool,
    /// Ordered log of interactions, for verification
    pub calls: Vec<String>,
    /// Every executed touch sequence, in order
    pub touches: Vec<TouchSequence>,
    /// Every navigated URL, in order
    pub navigations: Vec<String>,
    /// Text typed per locator, last write wins
    pub typed: HashMap<String, String>,
    closed: bool,
}

impl MockBackend {
    /// Create a mock of the given backend kind
    #[must_use]
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            created: Instant::now(),
            elements: HashMap::new(),
            click_effects: Vec::new(),
            window: (1080, 1920),
            script_result: Value::Null,
            screenshot_bytes: vec![0x89, 0x50, 0x4E, 0x47],
            recording_bytes: Vec::new(),
            recording: false,
            calls: Vec::new(),
            touches: Vec::new(),
            navigations: Vec::new(),
            typed: HashMap::new(),
            closed: false,
        }
    }

    /// Mobile-kind mock with a phone-shaped window
    #[must_use]
    pub fn mobile() -> Self {
        Self::new(BackendKind::Mobile)
    }

    /// Desktop-kind mock
    #[must_use]
    pub fn desktop() -> Self {
        let mut mock = Self::new(BackendKind::Desktop);
        mock.window = (1920, 1080);
        mock
    }

    /// Register an element under a locator
    pub fn add_element(&mut self, locator: &Locator, element: MockElement) -> &mut Self {
        self.elements.insert(locator.to_string(), element);
        self
    }

    /// When `clicked` is clicked, rewrite `target`'s text to `new_text`
    pub fn on_click_set_text(
        &mut self,
        clicked: &Locator,
        target: &Locator,
        new_text: impl Into<String>,
    ) -> &mut Self {
        self.click_effects.push(ClickEffect {
            clicked: clicked.to_string(),
            target: target.to_string(),
            new_text: new_text.into(),
        });
        self
    }

    /// Set the window dimensions
    pub fn set_window(&mut self, width: i64, height: i64) -> &mut Self {
        self.window = (width, height);
        self
    }

    /// Set the value returned by `execute_script`
    pub fn set_script_result(&mut self, value: Value) -> &mut Self {
        self.script_result = value;
        self
    }

    /// Set the bytes returned by `stop_recording`
    pub fn set_recording_bytes(&mut self, bytes: Vec<u8>) -> &mut Self {
        self.recording_bytes = bytes;
        self
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of executed touch sequences
    #[must_use]
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Poll until the element under `locator` satisfies `ready`
    fn resolve(
        &mut self,
        locator: &Locator,
        wait: &WaitPolicy,
        condition: &str,
        ready: impl Fn(&MockElement) -> bool,
    ) -> PilotResult<String> {
        let key = locator.to_string();
        let description = format!("element {locator} {condition}");
        // The mock cannot change concurrently, but late-appearing elements
        // flip `present` as wall-clock time passes inside the loop.
        let created = self.created;
        let touches = self.touches.len();
        let elements = self.elements.clone();
        poll_until(wait, &description, || {
            let present = elements.get(&key).filter(|element| {
                created.elapsed() >= element.appears_after
                    && touches >= element.appears_after_touches
            });
            Ok(match present {
                Some(element) if ready(element) => Some(key.clone()),
                _ => None,
            })
        })
    }

    fn apply_click_effects(&mut self, clicked_key: &str) {
        let effects: Vec<ClickEffect> = self
            .click_effects
            .iter()
            .filter(|e| e.clicked == clicked_key)
            .cloned()
            .collect();
        for effect in effects {
            if let Some(target) = self.elements.get_mut(&effect.target) {
                target.text = effect.new_text;
            }
        }
    }
}

impl Backend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn navigate(&mut self, url: &str) -> PilotResult<()> {
        self.calls.push(format!("navigate:{url}"));
        self.navigations.push(url.to_string());
        Ok(())
    }

    fn click(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<()> {
        let key = self.resolve(locator, wait, "clickable", |e| e.displayed && e.enabled)?;
        self.calls.push(format!("click:{key}"));
        self.apply_click_effects(&key);
        Ok(())
    }

    fn type_text(&mut self, locator: &Locator, text: &str, wait: &WaitPolicy) -> PilotResult<()> {
        let key = self.resolve(locator, wait, "present", |_| true)?;
        self.calls.push(format!("type:{key}={text}"));
        // clear-before-type: replacement, not append
        self.typed.insert(key.clone(), text.to_string());
        if let Some(element) = self.elements.get_mut(&key) {
            element.text = text.to_string();
        }
        Ok(())
    }

    fn read_text(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<String> {
        let key = self.resolve(locator, wait, "present", |_| true)?;
        self.calls.push(format!("read:{key}"));
        Ok(self
            .elements
            .get(&key)
            .map(|e| e.text.clone())
            .unwrap_or_default())
    }

    fn is_visible(&mut self, locator: &Locator, wait: &WaitPolicy) -> bool {
        self.resolve(locator, wait, "visible", |e| e.displayed).is_ok()
    }

    fn element_rect(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<Rect> {
        let key = self.resolve(locator, wait, "present", |_| true)?;
        Ok(self
            .elements
            .get(&key)
            .map(|e| e.rect)
            .unwrap_or(Rect::new(0, 0, 0, 0)))
    }

    fn window_size(&mut self) -> PilotResult<(i64, i64)> {
        Ok(self.window)
    }

    fn execute_script(&mut self, script: &str) -> PilotResult<Value> {
        self.calls.push(format!("script:{script}"));
        Ok(self.script_result.clone())
    }

    fn screenshot(&mut self) -> PilotResult<Vec<u8>> {
        Ok(self.screenshot_bytes.clone())
    }

    fn perform_touch(&mut self, sequence: &TouchSequence) -> PilotResult<()> {
        if self.kind != BackendKind::Mobile {
            return Err(PilotError::Gesture {
                message: format!("{} backend has no touch surface", self.kind),
            });
        }
        self.calls.push(format!(
            "touch:{} contacts",
            sequence.contacts().len()
        ));
        self.touches.push(sequence.clone());
        Ok(())
    }

    fn start_recording(&mut self) -> PilotResult<()> {
        if self.kind != BackendKind::Mobile {
            return Err(PilotError::Recording {
                message: format!("{} backend cannot record the screen", self.kind),
            });
        }
        self.recording = true;
        self.calls.push("start_recording".to_string());
        Ok(())
    }

    fn stop_recording(&mut self) -> PilotResult<Vec<u8>> {
        if !self.recording {
            return Err(PilotError::Recording {
                message: "no recording in progress".to_string(),
            });
        }
        self.recording = false;
        self.calls.push("stop_recording".to_string());
        Ok(self.recording_bytes.clone())
    }

    fn close(&mut self) -> PilotResult<()> {
        self.closed = true;
        self.calls.push("close".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> WaitPolicy {
        WaitPolicy::new(200, 10)
    }

    mod scripted_elements {
        use super::*;

        #[test]
        fn test_read_text() {
            let mut mock = MockBackend::desktop();
            let result = Locator::css("#result");
            mock.add_element(&result, MockElement::new("hello"));
            assert_eq!(mock.read_text(&result, &fast()).unwrap(), "hello");
        }

        #[test]
        fn test_missing_element_times_out() {
            let mut mock = MockBackend::desktop();
            let err = mock.read_text(&Locator::css("#ghost"), &fast()).unwrap_err();
            assert!(err.is_timeout());
        }

        #[test]
        fn test_late_element_found_within_budget() {
            let mut mock = MockBackend::desktop();
            let late = Locator::css("#late");
            mock.add_element(&late, MockElement::new("here").appears_after_ms(50));
            assert_eq!(mock.read_text(&late, &fast()).unwrap(), "here");
        }

        #[test]
        fn test_disabled_element_not_clickable() {
            let mut mock = MockBackend::desktop();
            let button = Locator::css("#btn");
            mock.add_element(&button, MockElement::new("Go").disabled());
            assert!(mock.click(&button, &fast()).unwrap_err().is_timeout());
        }

        #[test]
        fn test_click_effect_rewrites_target() {
            let mut mock = MockBackend::desktop();
            let button = Locator::css("#btn");
            let output = Locator::css("#out");
            mock.add_element(&button, MockElement::new("Go"));
            mock.add_element(&output, MockElement::new(""));
            mock.on_click_set_text(&button, &output, "done");
            mock.click(&button, &fast()).unwrap();
            assert_eq!(mock.read_text(&output, &fast()).unwrap(), "done");
        }

        #[test]
        fn test_type_replaces_content() {
            let mut mock = MockBackend::desktop();
            let input = Locator::name("q");
            mock.add_element(&input, MockElement::new("old"));
            mock.type_text(&input, "new", &fast()).unwrap();
            assert_eq!(mock.read_text(&input, &fast()).unwrap(), "new");
            assert_eq!(mock.typed.get("name:q").unwrap(), "new");
        }
    }

    mod probes {
        use super::*;

        #[test]
        fn test_is_visible_true() {
            let mut mock = MockBackend::desktop();
            let el = Locator::css("#here");
            mock.add_element(&el, MockElement::new("x"));
            assert!(mock.is_visible(&el, &fast()));
        }

        #[test]
        fn test_is_visible_false_for_hidden() {
            let mut mock = MockBackend::desktop();
            let el = Locator::css("#hidden");
            mock.add_element(&el, MockElement::new("x").hidden());
            assert!(!mock.is_visible(&el, &fast()));
        }

        #[test]
        fn test_is_visible_false_for_absent() {
            let mut mock = MockBackend::desktop();
            assert!(!mock.is_visible(&Locator::css("#ghost"), &fast()));
        }
    }

    mod recording {
        use super::*;

        #[test]
        fn test_recording_round_trip() {
            let mut mock = MockBackend::mobile();
            mock.set_recording_bytes(vec![1, 2, 3]);
            mock.start_recording().unwrap();
            assert_eq!(mock.stop_recording().unwrap(), vec![1, 2, 3]);
        }

        #[test]
        fn test_stop_without_start_errors() {
            let mut mock = MockBackend::mobile();
            assert!(matches!(
                mock.stop_recording(),
                Err(PilotError::Recording { .. })
            ));
        }

        #[test]
        fn test_desktop_cannot_record() {
            let mut mock = MockBackend::desktop();
            assert!(mock.start_recording().is_err());
        }
    }
}
