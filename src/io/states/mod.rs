use std::collections::HashMap;

use async_trait::async_trait;

use crate::evaluator::SampledValue;

pub mod dummy;
pub mod file;
pub mod home_assistant;

/// Raw states of the requested keys, taken once per cycle.
/// A key with no entry did not exist in the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    states: HashMap<String, String>,
}

impl StateSnapshot {
    pub fn new(states: HashMap<String, String>) -> Self {
        Self { states }
    }

    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.states.get(key).map(String::as_str)
    }

    pub fn sample(&self, key: &str) -> SampledValue {
        SampledValue::from_raw(self.get_raw(key))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

#[async_trait]
pub trait StateSource {
    /// Reads the current raw state of every key.
    /// Fails only when the registry as a whole cannot be read.
    async fn retrieve_states(&self, keys: &[String]) -> Result<StateSnapshot, String>;
}
