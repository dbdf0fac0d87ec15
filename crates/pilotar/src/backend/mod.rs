//! Backend abstraction over the three automation technologies.
//!
//! One `Backend` implementation exists per technology: the synchronous
//! WebDriver wire protocol for desktop browsers, a WebSocket bridge to a
//! browser-automation library, and the Appium flavor of the wire protocol
//! for mobile devices. The implementation is selected once, at
//! `DriverHandle` construction — call sites never re-inspect the concrete
//! type.
//!
//! The trait encodes the synchronization contract rather than leaving it to
//! callers: eager backends poll-wait for the operation's precondition
//! (clickable before click, presence before type/read), the lazy bridge
//! backend ships the selector and lets the remote library resolve and retry
//! internally.

mod bridge;
mod mobile;
mod mock;
mod webdriver;
mod wire;

pub use bridge::BridgePage;
pub use mobile::MobileSession;
pub use mock::{MockBackend, MockElement};
pub use webdriver::WebDriverSession;

use crate::gesture::TouchSequence;
use crate::locator::{Locator, Rect};
use crate::result::{PilotError, PilotResult};
use crate::wait::WaitPolicy;
use serde_json::Value;

/// Which automation technology a handle is backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Desktop browser over the WebDriver wire protocol
    Desktop,
    /// Browser-automation library behind the WebSocket bridge
    Bridge,
    /// Mobile device over the Appium protocol
    Mobile,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Desktop => write!(f, "desktop"),
            Self::Bridge => write!(f, "bridge"),
            Self::Mobile => write!(f, "mobile"),
        }
    }
}

/// Uniform interaction surface over one backend session.
///
/// Every operation that waits does so under the caller-supplied
/// [`WaitPolicy`]; a missed deadline surfaces as [`PilotError::Timeout`]
/// and aborts only the in-flight call. `is_visible` is the one total
/// operation: it is a probe, not an assertion, and maps every failure to
/// `false`.
pub trait Backend: Send {
    /// Backend technology tag
    fn kind(&self) -> BackendKind;

    /// Navigate to a URL
    fn navigate(&mut self, url: &str) -> PilotResult<()>;

    /// Click the element, waiting for it to be clickable on eager backends
    fn click(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<()>;

    /// Replace the element's content with `text`. Eager backends clear
    /// first; the bridge fill primitive is an atomic clear+insert.
    fn type_text(&mut self, locator: &Locator, text: &str, wait: &WaitPolicy) -> PilotResult<()>;

    /// Read the element's text content, waiting for presence
    fn read_text(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<String>;

    /// Probe element visibility. Never fails: absent elements, stale
    /// references and transport errors all read as `false`.
    fn is_visible(&mut self, locator: &Locator, wait: &WaitPolicy) -> bool;

    /// Bounding rectangle of the element, waiting for presence
    fn element_rect(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<Rect>;

    /// Viewport/screen dimensions as (width, height)
    fn window_size(&mut self) -> PilotResult<(i64, i64)>;

    /// Evaluate a script in the page context (web backends)
    fn execute_script(&mut self, script: &str) -> PilotResult<Value>;

    /// Capture a screenshot as PNG bytes
    fn screenshot(&mut self) -> PilotResult<Vec<u8>>;

    /// Execute a multi-contact touch sequence atomically (mobile only)
    fn perform_touch(&mut self, sequence: &TouchSequence) -> PilotResult<()> {
        let _ = sequence;
        Err(PilotError::Gesture {
            message: format!("{} backend has no touch surface", self.kind()),
        })
    }

    /// Begin screen recording (mobile only)
    fn start_recording(&mut self) -> PilotResult<()> {
        Err(PilotError::Recording {
            message: format!("{} backend cannot record the screen", self.kind()),
        })
    }

    /// Stop screen recording and return the captured MP4 bytes (mobile only)
    fn stop_recording(&mut self) -> PilotResult<Vec<u8>> {
        Err(PilotError::Recording {
            message: format!("{} backend cannot record the screen", self.kind()),
        })
    }

    /// Release the underlying session. Idempotent.
    fn close(&mut self) -> PilotResult<()>;
}

/// Handle to exactly one live backend session.
///
/// The tag is fixed at construction and the handle is owned exclusively by
/// the test that created it — it is deliberately not `Clone`. Dropping the
/// handle releases the remote session even when the owning test failed.
#[derive(Debug)]
pub enum DriverHandle {
    /// Desktop browser session
    Desktop(WebDriverSession),
    /// Automation-library page
    Bridge(BridgePage),
    /// Mobile device session
    Mobile(MobileSession),
}

macro_rules! delegate {
    ($self:ident, $session:ident => $body:expr) => {
        match $self {
            Self::Desktop($session) => $body,
            Self::Bridge($session) => $body,
            Self::Mobile($session) => $body,
        }
    };
}

impl Backend for DriverHandle {
    fn kind(&self) -> BackendKind {
        delegate!(self, s => s.kind())
    }

    fn navigate(&mut self, url: &str) -> PilotResult<()> {
        delegate!(self, s => s.navigate(url))
    }

    fn click(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<()> {
        delegate!(self, s => s.click(locator, wait))
    }

    fn type_text(&mut self, locator: &Locator, text: &str, wait: &WaitPolicy) -> PilotResult<()> {
        delegate!(self, s => s.type_text(locator, text, wait))
    }

    fn read_text(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<String> {
        delegate!(self, s => s.read_text(locator, wait))
    }

    fn is_visible(&mut self, locator: &Locator, wait: &WaitPolicy) -> bool {
        delegate!(self, s => s.is_visible(locator, wait))
    }

    fn element_rect(&mut self, locator: &Locator, wait: &WaitPolicy) -> PilotResult<Rect> {
        delegate!(self, s => s.element_rect(locator, wait))
    }

    fn window_size(&mut self) -> PilotResult<(i64, i64)> {
        delegate!(self, s => s.window_size())
    }

    fn execute_script(&mut self, script: &str) -> PilotResult<Value> {
        delegate!(self, s => s.execute_script(script))
    }

    fn screenshot(&mut self) -> PilotResult<Vec<u8>> {
        delegate!(self, s => s.screenshot())
    }

    fn perform_touch(&mut self, sequence: &TouchSequence) -> PilotResult<()> {
        delegate!(self, s => s.perform_touch(sequence))
    }

    fn start_recording(&mut self) -> PilotResult<()> {
        delegate!(self, s => s.start_recording())
    }

    fn stop_recording(&mut self) -> PilotResult<Vec<u8>> {
        delegate!(self, s => s.stop_recording())
    }

    fn close(&mut self) -> PilotResult<()> {
        delegate!(self, s => s.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal backend relying on every default trait body
    struct Plain(BackendKind);

    impl Backend for Plain {
        fn kind(&self) -> BackendKind {
            self.0
        }
        fn navigate(&mut self, _: &str) -> PilotResult<()> {
            Ok(())
        }
        fn click(&mut self, _: &Locator, _: &WaitPolicy) -> PilotResult<()> {
            Ok(())
        }
        fn type_text(&mut self, _: &Locator, _: &str, _: &WaitPolicy) -> PilotResult<()> {
            Ok(())
        }
        fn read_text(&mut self, _: &Locator, _: &WaitPolicy) -> PilotResult<String> {
            Ok(String::new())
        }
        fn is_visible(&mut self, _: &Locator, _: &WaitPolicy) -> bool {
            false
        }
        fn element_rect(&mut self, _: &Locator, _: &WaitPolicy) -> PilotResult<Rect> {
            Ok(Rect::new(0, 0, 0, 0))
        }
        fn window_size(&mut self) -> PilotResult<(i64, i64)> {
            Ok((0, 0))
        }
        fn execute_script(&mut self, _: &str) -> PilotResult<Value> {
            Ok(Value::Null)
        }
        fn screenshot(&mut self) -> PilotResult<Vec<u8>> {
            Ok(Vec::new())
        }
        fn close(&mut self) -> PilotResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", BackendKind::Desktop), "desktop");
        assert_eq!(format!("{}", BackendKind::Bridge), "bridge");
        assert_eq!(format!("{}", BackendKind::Mobile), "mobile");
    }

    #[test]
    fn test_touch_unsupported_off_mobile() {
        let mut plain = Plain(BackendKind::Desktop);
        let err = plain.perform_touch(&TouchSequence::default());
        assert!(matches!(err, Err(PilotError::Gesture { .. })));
    }

    #[test]
    fn test_recording_unsupported_off_mobile() {
        let mut plain = Plain(BackendKind::Bridge);
        assert!(matches!(
            plain.start_recording(),
            Err(PilotError::Recording { .. })
        ));
        assert!(matches!(
            plain.stop_recording(),
            Err(PilotError::Recording { .. })
        ));
    }
}
