use std::collections::HashMap;

use async_trait::async_trait;
use log::*;

use crate::io::home_assistant::HomeAssistantClient;

use super::{StateSnapshot, StateSource};

pub struct HomeAssistantStates {
    client: HomeAssistantClient,
}

impl HomeAssistantStates {
    pub fn new(client: HomeAssistantClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StateSource for HomeAssistantStates {
    async fn retrieve_states(&self, keys: &[String]) -> Result<StateSnapshot, String> {
        let mut states = HashMap::new();
        for key in keys {
            match self.client.get_state(key).await {
                Ok(Some(entity)) => {
                    states.insert(key.clone(), entity.state);
                }
                Ok(None) => error!("Entity '{}' does not exist in Home Assistant.", key),
                Err(e) => return Err(format!("Failed to read '{}' from Home Assistant: {}", key, e)),
            }
        }
        Ok(StateSnapshot::new(states))
    }
}
