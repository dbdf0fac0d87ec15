//! Pilotar: cross-platform UI test automation.
//!
//! One page-object abstraction over three automation backends, plus the
//! runner-side lifecycle around it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PILOTAR Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   Page objects (SearchPage, CalculatorPage, ...)                 │
//! │        │ uniform click / type / read / visible / gesture         │
//! │   ┌────▼─────┐   Backend trait, selected at construction         │
//! │   │ Driver   │──► WebDriverSession   (HTTP wire, eager waits)    │
//! │   │ Handle   │──► BridgePage         (WebSocket, lazy locators)  │
//! │   └──────────┘──► MobileSession      (Appium wire + touch)       │
//! │                                                                  │
//! │   LifecycleOrchestrator: retries · shard affinity · run records  │
//! │   Reports: run_info_*.json · performance_report.json · trends    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pilotar::config::FrameworkConfig;
//! use pilotar::pages::SearchPage;
//! use pilotar::session::{BrowserKind, Platform, SessionFactory};
//! use pilotar::wait::WaitPolicy;
//!
//! # fn main() -> pilotar::result::PilotResult<()> {
//! let config = FrameworkConfig::from_env();
//! let handle = SessionFactory::launch(Platform::Web, BrowserKind::Chrome, &config)?;
//! let mut search = SearchPage::new(handle, WaitPolicy::from_config(&config));
//! search.open(&config.base_url)?;
//! search.search("pilotar")?;
//! assert!(search.first_result_text()?.contains("pilotar"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Soft assertions: collect failures, surface them at `verify_all`
pub mod assertion;

/// Backend abstraction: the `Backend` trait, the three concrete sessions,
/// the tagged `DriverHandle` and the scripted mock
pub mod backend;

/// Framework configuration resolved once from the environment
pub mod config;

/// Gesture composition: multi-contact descriptors and the mobile page base
pub mod gesture;

/// Locators: (strategy, value) pairs across the backend vocabularies
pub mod locator;

/// Per-test lifecycle: state machine, rerun policy, session record table
pub mod lifecycle;

/// Page-object base and trait
pub mod page;

/// Concrete page objects
pub mod pages;

/// Performance collection and the per-session performance report
pub mod performance;

/// Run metadata persistence and historical trend aggregation
pub mod report;

/// Error and result types
pub mod result;

/// Session factory: platform/browser resolution and handle creation
pub mod session;

/// Shard-key affinity routing for distributed execution
pub mod shard;

/// Screen-recording capture for mobile sessions
pub mod video;

/// Blocking wait policy and poll helpers
pub mod wait;

pub use assertion::{AssertionFailure, SoftAssertionError, SoftAssertions};
pub use backend::{Backend, BackendKind, DriverHandle, MockBackend, MockElement};
pub use config::FrameworkConfig;
pub use gesture::{MobilePage, SwipeDirection, TouchSequence};
pub use lifecycle::{
    LifecycleOrchestrator, RetryPolicy, RetryStats, TestExecutionRecord, TestOutcome, TestState,
};
pub use locator::{Locator, Point, Rect, Strategy};
pub use page::{Page, PageObject};
pub use performance::{PerformanceReport, TestTiming};
pub use report::{RunMetadata, RunTotals, TrendAggregator, TrendReport};
pub use result::{PilotError, PilotResult};
pub use session::{BrowserKind, Platform, SessionFactory};
pub use shard::{shard_key, ShardRouter};
pub use video::VideoRecorder;
pub use wait::WaitPolicy;
