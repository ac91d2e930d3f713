use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::serde_as;
use serde_with::DurationSeconds;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::evaluator::MetricKind;

#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    poll: PollConfig,
    source: SourceConfig,
    metrics: MetricsConfig,
    #[serde(default)]
    output: OutputConfig,
}

impl Config {
    pub fn get_poll(&self) -> &PollConfig {
        &self.poll
    }

    pub fn get_source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn get_metrics(&self) -> &MetricsConfig {
        &self.metrics
    }

    pub fn get_output(&self) -> &OutputConfig {
        &self.output
    }
}

#[serde_as]
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// How often (in seconds) the sources are read and the metrics recomputed.
    #[serde_as(as = "DurationSeconds")]
    #[serde(default = "default_interval")]
    interval_secs: Duration,
    /// How old (in seconds) a live state file may be before a cycle is considered failed.
    #[serde_as(as = "DurationSeconds")]
    #[serde(default = "default_max_state_age")]
    max_state_age_secs: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_max_state_age() -> Duration {
    Duration::from_secs(5 * 60)
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_state_age_secs: default_max_state_age(),
        }
    }
}

impl PollConfig {
    pub fn get_interval(&self) -> &Duration {
        &self.interval_secs
    }

    pub fn get_max_state_age(&self) -> &Duration {
        &self.max_state_age_secs
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum SourceConfig {
    HomeAssistant(HomeAssistantConfig),
    LiveFile { path: PathBuf },
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HomeAssistantConfig {
    url: String,
    /// Long-lived access token. Falls back to the HA_TOKEN environment variable.
    #[serde(default)]
    token: Option<String>,
}

impl HomeAssistantConfig {
    pub fn new(url: String, token: Option<String>) -> Self {
        Self { url, token }
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_token(&self) -> Result<String, String> {
        self.token
            .clone()
            .or_else(|| std::env::var("HA_TOKEN").ok())
            .ok_or_else(|| "Home Assistant token not found in config or HA_TOKEN environment variable".to_owned())
    }
}

/// What the evaluator reads and computes.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default = "default_enabled")]
    enabled: Vec<MetricKind>,
    /// Input name (e.g. energy_today) to the source key it is read from.
    #[serde(default)]
    bindings: HashMap<String, String>,
    /// Numeric parameters, e.g. investment.
    #[serde(default)]
    params: HashMap<String, f64>,
    /// The date the installation started producing, for yearly projections.
    #[serde(default)]
    install_date: Option<NaiveDate>,
}

fn default_enabled() -> Vec<MetricKind> {
    vec![MetricKind::DailySavings]
}

impl MetricsConfig {
    pub fn new(
        enabled: Vec<MetricKind>,
        bindings: HashMap<String, String>,
        params: HashMap<String, f64>,
        install_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            enabled,
            bindings,
            params,
            install_date,
        }
    }

    pub fn get_enabled(&self) -> &[MetricKind] {
        &self.enabled
    }

    pub fn get_bindings(&self) -> &HashMap<String, String> {
        &self.bindings
    }

    pub fn get_params(&self) -> &HashMap<String, f64> {
        &self.params
    }

    pub fn get_install_date(&self) -> Option<NaiveDate> {
        self.install_date
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Prepended to every published identifier.
    unique_id_prefix: String,
    /// Display unit of the savings metrics.
    currency: String,
    sinks: Vec<SinkConfig>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            unique_id_prefix: "fve_payback_prediction".to_owned(),
            currency: "CZK".to_owned(),
            sinks: vec![SinkConfig::Log],
        }
    }
}

impl OutputConfig {
    pub fn get_unique_id_prefix(&self) -> &str {
        &self.unique_id_prefix
    }

    pub fn get_currency(&self) -> &str {
        &self.currency
    }

    pub fn get_sinks(&self) -> &[SinkConfig] {
        &self.sinks
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum SinkConfig {
    Log,
    /// Publishes back to Home Assistant, by default the same instance the states are read from.
    HomeAssistant {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        token: Option<String>,
    },
    LiveFile { path: PathBuf },
}
