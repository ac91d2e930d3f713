use std::collections::HashMap;

use chrono::Duration;

use super::*;
use crate::config::MetricsConfig;
use crate::time_util::mytime::DummyTimeProvider;
use crate::time_util::test_utils::{date, local_midday};

const ENERGY_TODAY: &str = "sensor.solar_energy_today";
const PRICE: &str = "sensor.price_per_kwh";
const TOTAL_ENERGY: &str = "sensor.solar_energy_total";

fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(name, key)| (name.to_string(), key.to_string())).collect()
}

fn params(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(name, value)| (name.to_string(), *value)).collect()
}

fn daily_config() -> MetricsConfig {
    MetricsConfig::new(
        vec![MetricKind::DailySavings],
        bindings(&[("energy_today", ENERGY_TODAY), ("price_per_unit", PRICE)]),
        HashMap::new(),
        None,
    )
}

fn full_config() -> MetricsConfig {
    MetricsConfig::new(
        vec![
            MetricKind::DailySavings,
            MetricKind::MonthlySavings,
            MetricKind::YearlySavings,
            MetricKind::EstimatedPayback,
        ],
        bindings(&[("energy_today", ENERGY_TODAY), ("price_per_unit", PRICE), ("total_energy", TOTAL_ENERGY)]),
        params(&[("investment", 100000.0), ("estimated_daily_production", 20.0)]),
        Some(date(2024, 1, 1)),
    )
}

fn reader<'a>(states: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> SampledValue + 'a {
    move |key| SampledValue::from_raw(states.get(key).copied())
}

#[test_log::test]
fn test_daily_savings_scenario() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&daily_config()).unwrap();
    let time = DummyTimeProvider::new(local_midday(2024, 6, 15));

    let states = HashMap::from([(ENERGY_TODAY, "123.4"), (PRICE, "2.5")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    assert_eq!(state.get_value(MetricKind::DailySavings), Some(308.5));
    assert!(!state.is_degraded());
    assert_eq!(state.get_last_error(), None);
    assert_eq!(state.get_last_refresh(), Some(local_midday(2024, 6, 15)));
}

#[test_log::test]
fn test_unavailable_input_degrades_to_zero() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&daily_config()).unwrap();
    let time = DummyTimeProvider::new(local_midday(2024, 6, 15));

    let states = HashMap::from([(ENERGY_TODAY, "unavailable"), (PRICE, "2.5")]);
    let state = evaluator.refresh(reader(&states), &time).expect("Degraded input should not fail the refresh");

    assert_eq!(state.get_value(MetricKind::DailySavings), Some(0.0));
    assert!(state.is_degraded());
    assert_eq!(state.get_degraded().len(), 1);
    assert_eq!(
        state.get_degraded()[0],
        DegradedInput::new(Input::EnergyToday, ENERGY_TODAY.to_owned(), SampledValue::Invalid)
    );
}

#[test]
fn test_missing_source_degrades_to_zero() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&daily_config()).unwrap();
    let time = DummyTimeProvider::new(local_midday(2024, 6, 15));

    let states = HashMap::from([(ENERGY_TODAY, "10")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    assert_eq!(state.get_value(MetricKind::DailySavings), Some(0.0));
    assert_eq!(
        state.get_degraded(),
        &[DegradedInput::new(Input::PricePerUnit, PRICE.to_owned(), SampledValue::Missing)]
    );
}

#[test]
fn test_refresh_before_configure() {
    let mut evaluator = Evaluator::new();
    let time = DummyTimeProvider::new(local_midday(2024, 6, 15));

    let result = evaluator.refresh(|_| SampledValue::Present(1.0), &time);
    assert_eq!(result, Err(EvaluatorError::NotConfigured));
    assert!(evaluator.current_values().is_empty());
}

#[test]
fn test_invalid_configure_leaves_unconfigured() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&daily_config()).unwrap();
    assert!(evaluator.is_configured());

    let broken = MetricsConfig::new(
        vec![MetricKind::DailySavings],
        bindings(&[("energy_today", ENERGY_TODAY)]),
        HashMap::new(),
        None,
    );
    assert!(matches!(evaluator.configure(&broken), Err(EvaluatorError::Configuration(_))));
    assert!(!evaluator.is_configured());

    let time = DummyTimeProvider::new(local_midday(2024, 6, 15));
    assert_eq!(evaluator.refresh(|_| SampledValue::Present(1.0), &time), Err(EvaluatorError::NotConfigured));
}

#[test]
fn test_configuration_errors() {
    let cases = [
        (
            "empty source key",
            MetricsConfig::new(
                vec![MetricKind::DailySavings],
                bindings(&[("energy_today", " "), ("price_per_unit", PRICE)]),
                HashMap::new(),
                None,
            ),
        ),
        (
            "unknown binding",
            MetricsConfig::new(
                vec![MetricKind::DailySavings],
                bindings(&[("energy_today", ENERGY_TODAY), ("price_per_unit", PRICE), ("energy", "sensor.x")]),
                HashMap::new(),
                None,
            ),
        ),
        (
            "monthly without total energy",
            MetricsConfig::new(
                vec![MetricKind::MonthlySavings],
                bindings(&[("energy_today", ENERGY_TODAY), ("price_per_unit", PRICE)]),
                HashMap::new(),
                None,
            ),
        ),
        (
            "yearly without install date",
            MetricsConfig::new(
                vec![MetricKind::YearlySavings],
                bindings(&[("total_energy", TOTAL_ENERGY), ("price_per_unit", PRICE)]),
                HashMap::new(),
                None,
            ),
        ),
        (
            "payback without production",
            MetricsConfig::new(
                vec![MetricKind::EstimatedPayback],
                bindings(&[("price_per_unit", PRICE)]),
                params(&[("investment", 1000.0)]),
                None,
            ),
        ),
        (
            "non finite parameter",
            MetricsConfig::new(
                vec![MetricKind::EstimatedPayback],
                bindings(&[("price_per_unit", PRICE)]),
                params(&[("investment", f64::NAN), ("estimated_daily_production", 1.0)]),
                None,
            ),
        ),
        ("nothing enabled", MetricsConfig::new(vec![], bindings(&[("price_per_unit", PRICE)]), HashMap::new(), None)),
    ];

    for (name, config) in cases {
        let mut evaluator = Evaluator::new();
        let result = evaluator.configure(&config);
        assert!(matches!(result, Err(EvaluatorError::Configuration(_))), "{}: expected configuration error, got {:?}", name, result);
    }
}

#[test]
fn test_current_values_idempotent() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&full_config()).unwrap();
    assert!(evaluator.current_values().is_empty());

    let time = DummyTimeProvider::new(local_midday(2024, 3, 1));
    let states = HashMap::from([(ENERGY_TODAY, "12"), (PRICE, "5"), (TOTAL_ENERGY, "600")]);
    evaluator.refresh(reader(&states), &time).unwrap();

    let first = evaluator.current_values();
    let second = evaluator.current_values();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn test_all_metrics() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&full_config()).unwrap();

    // 60 days after install, 1st of March in a leap year (31 days in the month).
    let time = DummyTimeProvider::new(local_midday(2024, 3, 1));
    let states = HashMap::from([(ENERGY_TODAY, "12"), (PRICE, "5"), (TOTAL_ENERGY, "600")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    assert_eq!(state.get_value(MetricKind::DailySavings), Some(60.0));
    // 600 / 1 * 31 * 5
    assert_eq!(state.get_value(MetricKind::MonthlySavings), Some(93000.0));
    // 600 / 60 * 365 * 5
    assert_eq!(state.get_value(MetricKind::YearlySavings), Some(18250.0));
    // 100000 / (5 * 20)
    assert_eq!(state.get_value(MetricKind::EstimatedPayback), Some(1000.0));
}

#[test]
fn test_monthly_projection_mid_month() {
    let config = MetricsConfig::new(
        vec![MetricKind::MonthlySavings],
        bindings(&[("total_energy", TOTAL_ENERGY), ("price_per_unit", PRICE)]),
        HashMap::new(),
        None,
    );
    let mut evaluator = Evaluator::new();
    evaluator.configure(&config).unwrap();

    let time = DummyTimeProvider::new(local_midday(2024, 2, 10));
    let states = HashMap::from([(TOTAL_ENERGY, "50"), (PRICE, "2")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    // 50 / 10 * 29 * 2
    assert_eq!(state.get_value(MetricKind::MonthlySavings), Some(290.0));
}

#[test]
fn test_yearly_before_install_is_zero() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&full_config()).unwrap();

    let time = DummyTimeProvider::new(local_midday(2023, 12, 1));
    let states = HashMap::from([(ENERGY_TODAY, "12"), (PRICE, "5"), (TOTAL_ENERGY, "600")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    assert_eq!(state.get_value(MetricKind::YearlySavings), Some(0.0));
}

#[test]
fn test_metrics_degrade_independently() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&full_config()).unwrap();

    let time = DummyTimeProvider::new(local_midday(2024, 3, 1));
    let states = HashMap::from([(ENERGY_TODAY, "unknown"), (PRICE, "5"), (TOTAL_ENERGY, "600")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    assert_eq!(state.get_value(MetricKind::DailySavings), Some(0.0));
    assert_eq!(state.get_value(MetricKind::EstimatedPayback), Some(1000.0));
    assert_eq!(state.get_value(MetricKind::YearlySavings), Some(18250.0));
}

#[test]
fn test_payback_with_zero_price() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&full_config()).unwrap();

    let time = DummyTimeProvider::new(local_midday(2024, 3, 1));
    let states = HashMap::from([(ENERGY_TODAY, "12"), (PRICE, "unavailable"), (TOTAL_ENERGY, "600")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    assert_eq!(state.get_value(MetricKind::EstimatedPayback), Some(0.0));
}

#[test]
fn test_failure_keeps_last_values() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&daily_config()).unwrap();
    let mut time = DummyTimeProvider::new(local_midday(2024, 6, 15));

    let states = HashMap::from([(ENERGY_TODAY, "123.4"), (PRICE, "2.5")]);
    evaluator.refresh(reader(&states), &time).unwrap();

    evaluator.record_failure("Home Assistant unreachable");
    assert_eq!(evaluator.get_state().get_value(MetricKind::DailySavings), Some(308.5));
    assert_eq!(evaluator.get_state().get_last_error(), Some("Home Assistant unreachable"));
    assert_eq!(evaluator.get_state().get_last_refresh(), Some(local_midday(2024, 6, 15)));

    time.advance(Duration::minutes(1));
    let states = HashMap::from([(ENERGY_TODAY, "124"), (PRICE, "2.5")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();
    assert_eq!(state.get_value(MetricKind::DailySavings), Some(310.0));
    assert_eq!(state.get_last_error(), None);
}

#[test]
fn test_huge_finite_inputs_publish_zero() {
    let mut evaluator = Evaluator::new();
    evaluator.configure(&daily_config()).unwrap();
    let time = DummyTimeProvider::new(local_midday(2024, 6, 15));

    let states = HashMap::from([(ENERGY_TODAY, "1e200"), (PRICE, "1e107")]);
    let state = evaluator.refresh(reader(&states), &time).unwrap();

    assert_eq!(state.get_value(MetricKind::DailySavings), Some(0.0));
    assert!(state.get_values().values().all(|value| value.is_finite()));
}

#[test]
fn test_local_midday_keeps_named_date() {
    let time = DummyTimeProvider::new(local_midday(2024, 3, 1));
    assert_eq!(time.get_local_time().date_naive(), date(2024, 3, 1));
}
