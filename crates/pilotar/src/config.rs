//! Framework configuration.
//!
//! One `FrameworkConfig` is read from environment variables at process start
//! and passed by reference to every component that needs it. Nothing in the
//! crate reads the environment after construction.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Default explicit-wait budget in milliseconds
pub const DEFAULT_EXPLICIT_WAIT_MS: u64 = 10_000;

/// Default polling interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default page-load budget in milliseconds
pub const DEFAULT_PAGE_LOAD_TIMEOUT_MS: u64 = 30_000;

/// Framework-wide configuration, resolved once from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Base URL for web scenarios
    pub base_url: String,
    /// Environment name (qa, staging, ...), recorded in run metadata
    pub environment: String,
    /// Default browser when the CLI does not override it
    pub browser: String,
    /// Run browsers headless
    pub headless: bool,
    /// Explicit wait budget in milliseconds
    pub explicit_wait_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Page-load budget in milliseconds
    pub page_load_timeout_ms: u64,
    /// WebDriver endpoint (chromedriver/geckodriver)
    pub webdriver_url: String,
    /// Appium server endpoint
    pub appium_hub: String,
    /// Automation-library bridge endpoint (WebSocket)
    pub bridge_url: String,
    /// Android device name for mobile capabilities
    pub android_device: String,
    /// Path to the Android app under test (empty = installed app)
    pub android_app_path: String,
    /// iOS device name for mobile capabilities
    pub ios_device: String,
    /// iOS platform version
    pub ios_version: String,
    /// Path to the iOS app under test (empty = installed app)
    pub ios_app_path: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.example.com".to_string(),
            environment: "qa".to_string(),
            browser: "chrome".to_string(),
            headless: false,
            explicit_wait_ms: DEFAULT_EXPLICIT_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            page_load_timeout_ms: DEFAULT_PAGE_LOAD_TIMEOUT_MS,
            webdriver_url: "http://localhost:9515".to_string(),
            appium_hub: "http://localhost:4723".to_string(),
            bridge_url: "ws://localhost:8787".to_string(),
            android_device: "Pixel_4_API_30".to_string(),
            android_app_path: String::new(),
            ios_device: "iPhone 12".to_string(),
            ios_version: "14.5".to_string(),
            ios_app_path: String::new(),
        }
    }
}

impl FrameworkConfig {
    /// Resolve configuration from environment variables, falling back to
    /// documented defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_str("BASE_URL", &defaults.base_url),
            environment: env_str("ENVIRONMENT", &defaults.environment),
            browser: env_str("BROWSER", &defaults.browser),
            headless: env_str("HEADLESS", "false").eq_ignore_ascii_case("true"),
            explicit_wait_ms: env_ms("EXPLICIT_WAIT", defaults.explicit_wait_ms),
            poll_interval_ms: env_ms("POLL_INTERVAL", defaults.poll_interval_ms),
            page_load_timeout_ms: env_ms("PAGE_LOAD_TIMEOUT", defaults.page_load_timeout_ms),
            webdriver_url: env_str("WEBDRIVER_URL", &defaults.webdriver_url),
            appium_hub: env_str("APPIUM_HUB", &defaults.appium_hub),
            bridge_url: env_str("BRIDGE_URL", &defaults.bridge_url),
            android_device: env_str("ANDROID_DEVICE", &defaults.android_device),
            android_app_path: env_str("ANDROID_APP_PATH", ""),
            ios_device: env_str("IOS_DEVICE", &defaults.ios_device),
            ios_version: env_str("IOS_VERSION", &defaults.ios_version),
            ios_app_path: env_str("IOS_APP_PATH", ""),
        }
    }

    /// Explicit wait budget as a Duration
    #[must_use]
    pub const fn explicit_wait(&self) -> Duration {
        Duration::from_millis(self.explicit_wait_ms)
    }

    /// Polling interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// W3C capabilities for an Android UiAutomator2 session
    #[must_use]
    pub fn android_capabilities(&self) -> Value {
        json!({
            "platformName": "Android",
            "appium:automationName": "UiAutomator2",
            "appium:deviceName": self.android_device,
            "appium:app": self.android_app_path,
            "appium:noReset": false,
        })
    }

    /// W3C capabilities for an iOS XCUITest session
    #[must_use]
    pub fn ios_capabilities(&self) -> Value {
        json!({
            "platformName": "iOS",
            "appium:automationName": "XCUITest",
            "appium:deviceName": self.ios_device,
            "appium:platformVersion": self.ios_version,
            "appium:app": self.ios_app_path,
            "appium:noReset": false,
        })
    }

    /// W3C capabilities for a desktop Chrome session
    #[must_use]
    pub fn chrome_capabilities(&self) -> Value {
        let mut args = vec!["--start-maximized", "--disable-extensions"];
        if self.headless {
            args.push("--headless=new");
        }
        json!({
            "browserName": "chrome",
            "goog:chromeOptions": { "args": args },
        })
    }

    /// W3C capabilities for a desktop Firefox session
    #[must_use]
    pub fn firefox_capabilities(&self) -> Value {
        let args: Vec<&str> = if self.headless {
            vec!["-headless"]
        } else {
            Vec::new()
        };
        json!({
            "browserName": "firefox",
            "moz:firefoxOptions": { "args": args },
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_ms(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
