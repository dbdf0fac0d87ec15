//! Locator abstraction for element selection.
//!
//! A locator is an immutable (strategy, value) pair. Strategies are
//! backend-specific vocabularies: css/xpath/name address DOM documents,
//! accessibility-id/uiautomator/predicate address native view trees. The
//! same value is never portable across backend kinds — a locator built for
//! a mobile page object is meaningless against a desktop session.

use serde::{Deserialize, Serialize};

/// Element addressing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// CSS selector (web backends)
    Css,
    /// XPath expression (web and mobile)
    XPath,
    /// Element id attribute
    Id,
    /// Form-control name attribute (web)
    Name,
    /// Anchor link text (web)
    LinkText,
    /// data-testid attribute (web)
    TestId,
    /// Accessibility id (mobile)
    AccessibilityId,
    /// Android UiAutomator expression (mobile)
    AndroidUiAutomator,
    /// iOS NSPredicate string (mobile)
    IosPredicate,
    /// iOS class chain expression (mobile)
    IosClassChain,
}

impl Strategy {
    /// Wire-protocol `using` value for the WebDriver/Appium element endpoints.
    ///
    /// `Id`, `Name` and `TestId` have no W3C strategy of their own and are
    /// expressed through css/attribute selectors at request time.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Css | Self::Id | Self::Name | Self::TestId => "css selector",
            Self::XPath => "xpath",
            Self::LinkText => "link text",
            Self::AccessibilityId => "accessibility id",
            Self::AndroidUiAutomator => "-android uiautomator",
            Self::IosPredicate => "-ios predicate string",
            Self::IosClassChain => "-ios class chain",
        }
    }

    /// True for strategies only meaningful against a mobile session
    #[must_use]
    pub const fn is_mobile(&self) -> bool {
        matches!(
            self,
            Self::AccessibilityId
                | Self::AndroidUiAutomator
                | Self::IosPredicate
                | Self::IosClassChain
        )
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Id => "id",
            Self::Name => "name",
            Self::LinkText => "link-text",
            Self::TestId => "test-id",
            Self::AccessibilityId => "accessibility-id",
            Self::AndroidUiAutomator => "android-uiautomator",
            Self::IosPredicate => "ios-predicate",
            Self::IosClassChain => "ios-class-chain",
        };
        write!(f, "{name}")
    }
}

/// Immutable (strategy, value) pair identifying an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Addressing strategy
    pub strategy: Strategy,
    /// Strategy-specific expression
    pub value: String,
}

impl Locator {
    /// Create a locator
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// CSS selector locator
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Name-attribute locator
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(Strategy::Name, value)
    }

    /// Accessibility-id locator
    #[must_use]
    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(Strategy::AccessibilityId, value)
    }

    /// Android UiAutomator locator
    #[must_use]
    pub fn uiautomator(value: impl Into<String>) -> Self {
        Self::new(Strategy::AndroidUiAutomator, value)
    }

    /// iOS predicate locator
    #[must_use]
    pub fn ios_predicate(value: impl Into<String>) -> Self {
        Self::new(Strategy::IosPredicate, value)
    }

    /// iOS class chain locator
    #[must_use]
    pub fn ios_class_chain(value: impl Into<String>) -> Self {
        Self::new(Strategy::IosClassChain, value)
    }

    /// UiAutomator locator matching any element whose text contains `text`
    #[must_use]
    pub fn text_contains(text: &str) -> Self {
        Self::uiautomator(format!("new UiSelector().textContains(\"{text}\")"))
    }

    /// (using, value) pair for the WebDriver/Appium element endpoints
    #[must_use]
    pub fn wire_params(&self) -> (&'static str, String) {
        let value = match self.strategy {
            Strategy::Id => format!("#{}", self.value),
            Strategy::Name => format!("[name=\"{}\"]", self.value),
            Strategy::TestId => format!("[data-testid=\"{}\"]", self.value),
            _ => self.value.clone(),
        };
        (self.strategy.wire_name(), value)
    }

    /// Selector expression for the automation-library bridge.
    ///
    /// The bridge resolves selectors lazily on every action, so this is the
    /// only form a lazy handle ever carries.
    #[must_use]
    pub fn bridge_selector(&self) -> String {
        match self.strategy {
            Strategy::Css => format!("css={}", self.value),
            Strategy::XPath => format!("xpath={}", self.value),
            Strategy::Id => format!("css=#{}", self.value),
            Strategy::Name => format!("css=[name=\"{}\"]", self.value),
            Strategy::LinkText => format!("text={}", self.value),
            Strategy::TestId => format!("css=[data-testid=\"{}\"]", self.value),
            // Mobile vocabularies have no bridge rendering; passed through
            // verbatim so a misdirected call fails loudly on the remote end.
            _ => self.value.clone(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.strategy, self.value)
    }
}

/// Integer screen coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate in pixels
    pub x: i64,
    /// Y coordinate in pixels
    pub y: i64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Element bounding rectangle in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
}

impl Rect {
    /// Create a new rectangle
    #[must_use]
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the rectangle
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }
}
