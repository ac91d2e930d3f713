use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::OutputConfig;
use crate::evaluator::{EvaluatorState, Unit};

pub mod file;
pub mod home_assistant;
pub mod console;

/// One derived value, ready to be rendered.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PublishedMetric {
    pub unique_id: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub icon: String,
    /// Degraded inputs this metric reads, the cause of a fallback 0.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

/// Everything published after a cycle.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Publication {
    /// When the values were computed, which may be earlier than now if the last cycle failed.
    pub computed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub degraded: Vec<String>,
    pub metrics: Vec<PublishedMetric>,
}

impl Publication {
    pub fn from_state(state: &EvaluatorState, output: &OutputConfig) -> Self {
        let metrics = state
            .get_values()
            .iter()
            .map(|(kind, value)| {
                let metric = kind.metric();
                let unit = match metric.get_unit() {
                    Unit::Currency => output.get_currency().to_owned(),
                    Unit::Days => "days".to_owned(),
                };
                PublishedMetric {
                    unique_id: kind.unique_id(output.get_unique_id_prefix()),
                    name: metric.get_name().to_owned(),
                    value: *value,
                    unit,
                    icon: metric.get_icon().to_owned(),
                    degraded: state
                        .get_degraded()
                        .iter()
                        .filter(|d| metric.get_inputs().contains(&d.get_input()))
                        .map(|d| d.to_string())
                        .collect(),
                }
            })
            .collect();

        Self {
            computed_at: state.get_last_refresh(),
            last_error: state.get_last_error().map(str::to_owned),
            degraded: state.get_degraded().iter().map(|d| d.to_string()).collect(),
            metrics,
        }
    }
}

#[async_trait]
pub trait MetricSink {
    fn name(&self) -> &str;

    async fn publish(&self, publication: &Publication) -> Result<(), String>;
}
