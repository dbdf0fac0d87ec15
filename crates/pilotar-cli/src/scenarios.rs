//! Built-in scenario registry.
//!
//! A scenario is a plain function over a freshly launched handle. It takes
//! ownership for the duration of the attempt and hands the handle back on
//! success so the runner can harvest page metrics and recordings; on
//! failure the handle drops inside the page objects and the session is
//! released by `Drop`.

use pilotar::backend::DriverHandle;
use pilotar::config::FrameworkConfig;
use pilotar::gesture::SwipeDirection;
use pilotar::pages::{CalculatorPage, IosCalculatorPage, SearchPage};
use pilotar::result::PilotResult;
use pilotar::session::{BrowserKind, Platform};
use pilotar::wait::WaitPolicy;

/// Environment handed to every scenario attempt
#[derive(Debug, Clone)]
pub struct ScenarioEnv {
    /// Framework configuration for the session
    pub config: FrameworkConfig,
    /// Browser selected for web scenarios
    pub browser: BrowserKind,
    /// Wait policy for page interactions
    pub wait: WaitPolicy,
}

/// Scenario entry point: run against a handle, return it on success
pub type ScenarioFn = fn(DriverHandle, &ScenarioEnv) -> PilotResult<DriverHandle>;

/// One registered scenario
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    /// Stable identifier; the leading segment is the platform grouping
    pub id: &'static str,
    /// Platform the scenario targets
    pub platform: Platform,
    /// Explicit flaky marker with its rerun budget
    pub flaky_reruns: Option<u32>,
    /// Entry point
    pub run: ScenarioFn,
}

/// Every scenario shipped with the runner
#[must_use]
pub fn registry() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "web::search::first_result",
            platform: Platform::Web,
            flaky_reruns: None,
            run: web_search_first_result,
        },
        Scenario {
            id: "web::search::input_visible",
            platform: Platform::Web,
            flaky_reruns: None,
            run: web_search_input_visible,
        },
        Scenario {
            id: "android::calculator::sum",
            platform: Platform::Android,
            flaky_reruns: None,
            run: android_calculator_sum,
        },
        Scenario {
            id: "android::calculator::gestures",
            platform: Platform::Android,
            flaky_reruns: Some(1),
            run: android_calculator_gestures,
        },
        Scenario {
            id: "ios::calculator::sum",
            platform: Platform::Ios,
            flaky_reruns: None,
            run: ios_calculator_sum,
        },
    ]
}

/// Scenarios for one platform, optionally filtered by id substring
#[must_use]
pub fn select(platform: Platform, filter: Option<&str>) -> Vec<Scenario> {
    registry()
        .into_iter()
        .filter(|s| s.platform == platform)
        .filter(|s| filter.map_or(true, |needle| s.id.contains(needle)))
        .collect()
}

fn web_search_first_result(handle: DriverHandle, env: &ScenarioEnv) -> PilotResult<DriverHandle> {
    let query = "pilotar";
    let mut search = SearchPage::new(handle, env.wait);
    search.open(&env.config.base_url)?;
    search.search(query)?;

    let visible = search.results_visible();
    let first = search.first_result_text()?;
    let soft = search.page().soft_assert();
    soft.assert_true(visible, "search results should be visible");
    soft.assert_contains(&first, query, "first result should mention the query");
    soft.verify_all()?;
    Ok(search.into_handle())
}

fn web_search_input_visible(handle: DriverHandle, env: &ScenarioEnv) -> PilotResult<DriverHandle> {
    let mut search = SearchPage::new(handle, env.wait);
    search.open(&env.config.base_url)?;

    let input_visible = search
        .page()
        .is_visible(&SearchPage::<DriverHandle>::search_input());
    let soft = search.page().soft_assert();
    soft.assert_true(input_visible, "query input should be visible");
    soft.verify_all()?;
    Ok(search.into_handle())
}

fn android_calculator_sum(handle: DriverHandle, env: &ScenarioEnv) -> PilotResult<DriverHandle> {
    let mut calculator = CalculatorPage::new(handle, env.wait);
    calculator.clear()?;
    let result = calculator.calculate_sum(5, 3)?;

    let soft = calculator.mobile().page().soft_assert();
    soft.assert_eq(&result.as_str(), &"8", "addition result should be 8");
    soft.verify_all()?;
    Ok(calculator.into_handle())
}

fn android_calculator_gestures(
    handle: DriverHandle,
    env: &ScenarioEnv,
) -> PilotResult<DriverHandle> {
    type Calc = CalculatorPage<DriverHandle>;
    let mut calculator = CalculatorPage::new(handle, env.wait);
    calculator.clear()?;

    calculator.tap_digit(1)?.tap_digit(2)?.tap_digit(3)?;
    let entered = calculator.result()?;
    calculator
        .mobile()
        .page()
        .soft_assert()
        .assert_eq(&entered.as_str(), &"123", "tapped digits should appear in sequence");

    calculator
        .mobile()
        .swipe_element(&Calc::result_field(), SwipeDirection::Left, 0.5)?;
    calculator.mobile().long_press(&Calc::clear_button(), 1000)?;
    calculator.mobile().pull_to_refresh()?;

    calculator.mobile().page().soft_assert().verify_all()?;
    Ok(calculator.into_handle())
}

fn ios_calculator_sum(handle: DriverHandle, env: &ScenarioEnv) -> PilotResult<DriverHandle> {
    let mut calculator = IosCalculatorPage::new(handle, env.wait);
    let result = calculator.calculate_sum(5, 3)?;

    let soft = calculator.mobile().page().soft_assert();
    soft.assert_eq(&result.as_str(), &"8", "addition result should be 8");
    soft.verify_all()?;
    Ok(calculator.into_handle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilotar::shard::shard_key;

    #[test]
    fn test_ids_lead_with_platform_grouping() {
        for scenario in registry() {
            assert_eq!(shard_key(scenario.id), scenario.platform.as_str());
        }
    }

    #[test]
    fn test_select_by_platform() {
        let web = select(Platform::Web, None);
        assert_eq!(web.len(), 2);
        assert!(web.iter().all(|s| s.platform == Platform::Web));

        let ios = select(Platform::Ios, None);
        assert_eq!(ios.len(), 1);
    }

    #[test]
    fn test_select_with_filter() {
        let filtered = select(Platform::Android, Some("gestures"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "android::calculator::gestures");
    }

    #[test]
    fn test_registry_ids_unique() {
        let mut ids: Vec<&str> = registry().iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), registry().len());
    }
}
