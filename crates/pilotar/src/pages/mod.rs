//! Concrete page objects shipped with the framework.
//!
//! Each page is generic over [`crate::backend::Backend`], so the same page
//! drives a desktop session, a bridge page or a device — and the scripted
//! mock in tests.

mod calculator;
mod search;

pub use calculator::{CalculatorPage, IosCalculatorPage};
pub use search::SearchPage;
