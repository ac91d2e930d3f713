use async_trait::async_trait;
use log::*;
use serde_json::{json, Map};

use crate::io::home_assistant::{HomeAssistantClient, StateUpdate};

use super::{MetricSink, Publication, PublishedMetric};

/// Publishes each metric as a `sensor.<unique_id>` entity.
pub struct HomeAssistantSink {
    client: HomeAssistantClient,
}

impl HomeAssistantSink {
    pub fn new(client: HomeAssistantClient) -> Self {
        Self { client }
    }
}

fn to_update(metric: &PublishedMetric, publication: &Publication) -> StateUpdate {
    let mut attributes = Map::new();
    attributes.insert("friendly_name".to_owned(), json!(metric.name));
    attributes.insert("unit_of_measurement".to_owned(), json!(metric.unit));
    attributes.insert("icon".to_owned(), json!(metric.icon));
    attributes.insert("unique_id".to_owned(), json!(metric.unique_id));
    if let Some(computed_at) = publication.computed_at {
        attributes.insert("computed_at".to_owned(), json!(computed_at));
    }
    if let Some(error) = &publication.last_error {
        attributes.insert("last_error".to_owned(), json!(error));
    }
    if !metric.degraded.is_empty() {
        attributes.insert("degraded_inputs".to_owned(), json!(metric.degraded));
    }

    StateUpdate {
        state: metric.value.to_string(),
        attributes,
    }
}

#[async_trait]
impl MetricSink for HomeAssistantSink {
    fn name(&self) -> &str {
        "home assistant"
    }

    async fn publish(&self, publication: &Publication) -> Result<(), String> {
        let mut failures = Vec::new();
        for metric in &publication.metrics {
            let entity_id = format!("sensor.{}", metric.unique_id);
            match self.client.set_state(&entity_id, &to_update(metric, publication)).await {
                Ok(()) => debug!("Published {} = {}", entity_id, metric.value),
                Err(e) => failures.push(format!("{}: {}", entity_id, e)),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }
}
