use async_trait::async_trait;
use log::*;

use super::{MetricSink, Publication};

/// Renders every metric as a log line.
#[derive(Default)]
pub struct LogSink {}

#[async_trait]
impl MetricSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, publication: &Publication) -> Result<(), String> {
        for metric in &publication.metrics {
            info!("{}: {:.2} {} ({})", metric.name, metric.value, metric.unit, metric.unique_id);
        }
        if let Some(error) = &publication.last_error {
            warn!("Values above are from {:?}, last refresh failed: {}", publication.computed_at, error);
        }
        Ok(())
    }
}
