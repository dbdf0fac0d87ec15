//! Session factory: platform/browser resolution and handle creation.
//!
//! Unknown platform or browser identifiers fail here, at creation time —
//! fatal for the requesting test and never retried. Session release is
//! guaranteed by the handles' `Drop` implementations, so a panicking or
//! failing test still quits its remote session.

use crate::backend::{BridgePage, DriverHandle, MobileSession, WebDriverSession};
use crate::config::FrameworkConfig;
use crate::result::{PilotError, PilotResult};
use tracing::info;

/// Target platform for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Desktop web browser
    Web,
    /// Android device
    Android,
    /// iOS device
    Ios,
}

impl Platform {
    /// Parse a CLI/platform identifier.
    ///
    /// # Errors
    ///
    /// `PilotError::UnsupportedPlatform` for anything but web/android/ios.
    pub fn parse(name: &str) -> PilotResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            _ => Err(PilotError::UnsupportedPlatform {
                name: name.to_string(),
            }),
        }
    }

    /// Canonical identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Browser choice for web sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Chrome through the WebDriver protocol
    Chrome,
    /// Firefox through the WebDriver protocol
    Firefox,
    /// The automation-library page behind the bridge
    Playwright,
}

impl BrowserKind {
    /// Parse a CLI/browser identifier.
    ///
    /// # Errors
    ///
    /// `PilotError::UnsupportedBrowser` for anything but
    /// chrome/firefox/playwright.
    pub fn parse(name: &str) -> PilotResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            "playwright" => Ok(Self::Playwright),
            _ => Err(PilotError::UnsupportedBrowser {
                name: name.to_string(),
            }),
        }
    }

    /// Canonical identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Playwright => "playwright",
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates and releases backend sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFactory;

impl SessionFactory {
    /// Open a handle for the platform/browser pair.
    ///
    /// # Errors
    ///
    /// `UnsupportedPlatform`/`UnsupportedBrowser` never occur here — they
    /// are caught at parse time — but session creation can fail with
    /// transport and capability errors from the remote end.
    pub fn launch(
        platform: Platform,
        browser: BrowserKind,
        config: &FrameworkConfig,
    ) -> PilotResult<DriverHandle> {
        info!(%platform, %browser, "launching session");
        match platform {
            Platform::Web => match browser {
                BrowserKind::Chrome => Ok(DriverHandle::Desktop(WebDriverSession::open(
                    &config.webdriver_url,
                    browser.as_str(),
                    &config.chrome_capabilities(),
                    config.page_load_timeout_ms,
                )?)),
                BrowserKind::Firefox => Ok(DriverHandle::Desktop(WebDriverSession::open(
                    &config.webdriver_url,
                    browser.as_str(),
                    &config.firefox_capabilities(),
                    config.page_load_timeout_ms,
                )?)),
                BrowserKind::Playwright => Ok(DriverHandle::Bridge(BridgePage::connect(
                    &config.bridge_url,
                    config.headless,
                )?)),
            },
            Platform::Android => Ok(DriverHandle::Mobile(MobileSession::open(
                &config.appium_hub,
                platform.as_str(),
                &config.android_capabilities(),
            )?)),
            Platform::Ios => Ok(DriverHandle::Mobile(MobileSession::open(
                &config.appium_hub,
                platform.as_str(),
                &config.ios_capabilities(),
            )?)),
        }
    }

    /// Release a handle explicitly. Dropping the handle has the same
    /// effect; this form surfaces teardown errors.
    ///
    /// # Errors
    ///
    /// Transport errors from the remote quit.
    pub fn release(mut handle: DriverHandle) -> PilotResult<()> {
        use crate::backend::Backend;
        handle.close()
    }
}
