use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use log::*;

use crate::config::MetricsConfig;
use crate::time_util::mytime::TimeProvider;

pub use error::{DegradedInput, EvaluatorError};
pub use metric::{Input, MetricInputs, MetricKind, Param, Unit};
pub use sample::SampledValue;

mod error;
pub mod formula;
mod metric;
mod sample;

#[cfg(test)]
mod test;

/// An external value the evaluator reads each refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    input: Input,
    source_key: String,
}

impl InputBinding {
    pub fn get_source_key(&self) -> &str {
        &self.source_key
    }
}

#[derive(Debug)]
struct ValidConfig {
    bindings: Vec<InputBinding>,
    params: HashMap<Param, f64>,
    install_date: Option<NaiveDate>,
    metrics: Vec<MetricKind>,
}

impl ValidConfig {
    fn param_or_zero(&self, param: Param) -> f64 {
        self.params.get(&param).copied().unwrap_or(0.0)
    }
}

/// Snapshot read by the exposition layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluatorState {
    values: BTreeMap<MetricKind, f64>,
    last_refresh: Option<DateTime<Utc>>,
    last_error: Option<String>,
    degraded: Vec<DegradedInput>,
}

impl EvaluatorState {
    pub fn get_values(&self) -> &BTreeMap<MetricKind, f64> {
        &self.values
    }

    pub fn get_value(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    /// When the values were last computed.
    pub fn get_last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    pub fn get_last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Inputs that fell back to zero during the last refresh.
    pub fn get_degraded(&self) -> &[DegradedInput] {
        &self.degraded
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Evaluator {
    config: Option<ValidConfig>,
    state: EvaluatorState,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adopts a configuration. On failure the evaluator is left unconfigured.
    pub fn configure(&mut self, config: &MetricsConfig) -> Result<(), EvaluatorError> {
        self.config = None;
        let valid = validate(config)?;
        info!(
            "Configured metrics [{}] from [{}]",
            valid.metrics.iter().join(", "),
            valid.bindings.iter().map(|b| format!("{}={}", b.input, b.source_key)).join(", ")
        );
        self.config = Some(valid);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub fn get_bindings(&self) -> &[InputBinding] {
        match &self.config {
            Some(config) => &config.bindings,
            None => &[],
        }
    }

    /// Samples every binding through `read` and recomputes all metrics.
    ///
    /// Missing or invalid samples count as zero and are recorded as degraded, they never fail
    /// the refresh. Only a missing or invalid configuration does.
    pub fn refresh<R>(&mut self, read: R, time: &impl TimeProvider) -> Result<&EvaluatorState, EvaluatorError>
    where
        R: Fn(&str) -> SampledValue,
    {
        let config = self.config.as_ref().ok_or(EvaluatorError::NotConfigured)?;

        let mut samples: HashMap<Input, f64> = HashMap::new();
        let mut degraded = Vec::new();
        for binding in &config.bindings {
            let sample = read(binding.source_key.as_str());
            trace!("{} ({}) = {}", binding.input, binding.source_key, sample);
            if sample.is_degraded() {
                let condition = DegradedInput::new(binding.input, binding.source_key.clone(), sample);
                warn!("Degraded input: {}", condition);
                degraded.push(condition);
            }
            samples.insert(binding.input, sample.or_zero());
        }

        let sampled = |input: Input| samples.get(&input).copied().unwrap_or(0.0);
        let inputs = MetricInputs {
            energy_today: sampled(Input::EnergyToday),
            price_per_unit: sampled(Input::PricePerUnit),
            total_energy: sampled(Input::TotalEnergy),
            investment: config.param_or_zero(Param::Investment),
            estimated_daily_production: config.param_or_zero(Param::EstimatedDailyProduction),
            today: time.get_local_time().date_naive(),
            install_date: config.install_date,
        };

        let values: BTreeMap<MetricKind, f64> = config
            .metrics
            .iter()
            .map(|kind| (*kind, kind.metric().evaluate(&inputs)))
            .collect();
        debug!("Computed {}", values.iter().map(|(kind, value)| format!("{}={}", kind, value)).join(", "));

        self.state = EvaluatorState {
            values,
            last_refresh: Some(time.get_utc_time()),
            last_error: None,
            degraded,
        };
        Ok(&self.state)
    }

    /// Records that no snapshot could be taken this cycle. The last computed values are kept.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        let error = error.into();
        match self.state.last_refresh {
            Some(last) => warn!("Refresh failed: {}, keeping values from {}", error, last),
            None => warn!("Refresh failed: {}, no values computed yet", error),
        }
        self.state.last_error = Some(error);
    }

    /// The last computed values. Never reads any source.
    pub fn current_values(&self) -> BTreeMap<MetricKind, f64> {
        self.state.values.clone()
    }

    pub fn get_state(&self) -> &EvaluatorState {
        &self.state
    }
}

fn validate(config: &MetricsConfig) -> Result<ValidConfig, EvaluatorError> {
    let mut bindings = Vec::new();
    for (name, source_key) in config.get_bindings() {
        let input = Input::from_str(name)
            .map_err(|_| EvaluatorError::Configuration(format!("Unknown binding '{}'", name)))?;
        if source_key.trim().is_empty() {
            return Err(EvaluatorError::Configuration(format!("Binding '{}' has an empty source key", name)));
        }
        bindings.push(InputBinding {
            input,
            source_key: source_key.trim().to_owned(),
        });
    }
    bindings.sort_by_key(|binding| binding.input);

    let mut params = HashMap::new();
    for (name, value) in config.get_params() {
        let param = Param::from_str(name)
            .map_err(|_| EvaluatorError::Configuration(format!("Unknown parameter '{}'", name)))?;
        if !value.is_finite() {
            return Err(EvaluatorError::Configuration(format!("Parameter '{}' must be a finite number, got {}", name, value)));
        }
        params.insert(param, *value);
    }

    let metrics: Vec<MetricKind> = config.get_enabled().iter().copied().unique().collect();
    if metrics.is_empty() {
        return Err(EvaluatorError::Configuration("No metrics enabled".to_owned()));
    }

    for kind in &metrics {
        let metric = kind.metric();
        for input in metric.get_inputs() {
            if !bindings.iter().any(|binding| binding.input == *input) {
                return Err(EvaluatorError::Configuration(format!("{} requires binding '{}'", kind, input)));
            }
        }
        for param in metric.get_params() {
            if !params.contains_key(param) {
                return Err(EvaluatorError::Configuration(format!("{} requires parameter '{}'", kind, param)));
            }
        }
        if metric.needs_install_date() && config.get_install_date().is_none() {
            return Err(EvaluatorError::Configuration(format!("{} requires install_date", kind)));
        }
    }

    Ok(ValidConfig {
        bindings,
        params,
        install_date: config.get_install_date(),
        metrics,
    })
}
