pub mod dummy;
pub mod home_assistant;
pub mod live_data;
pub mod sinks;
pub mod states;

use log::*;

use crate::io::sinks::{MetricSink, Publication};
use crate::io::states::StateSource;

/// Where states are read from and where the derived values go.
pub struct IOBundle {
    state_source: Box<dyn StateSource + Send + Sync>,
    sinks: Vec<Box<dyn MetricSink + Send + Sync>>,
}

impl IOBundle {
    pub fn new(state_source: impl StateSource + Send + Sync + 'static) -> IOBundle {
        IOBundle {
            state_source: Box::new(state_source),
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl MetricSink + Send + Sync + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn state_source(&self) -> &(dyn StateSource + Send + Sync) {
        &*self.state_source
    }

    /// Hands the publication to every sink. A failing sink does not stop the others.
    pub async fn publish(&self, publication: &Publication) {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(publication).await {
                error!("Failed to publish to {}: {}", sink.name(), e);
            }
        }
    }
}
