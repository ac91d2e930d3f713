use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::*;
use serde::Deserialize;

use crate::io::live_data::{check_age, AgeType, CachedPrevious};

use super::{StateSnapshot, StateSource};

/// States exported to a JSON file by another process.
pub struct LiveFileStates {
    file: PathBuf,
    max_age: Duration,
    last_data: CachedPrevious<StatesFileData>,
}

impl LiveFileStates {
    pub fn new(file: PathBuf, max_age: Duration) -> Self {
        Self {
            file,
            max_age,
            last_data: CachedPrevious::none(),
        }
    }

    pub fn read_states_data(&self) -> Result<StatesFileData, String> {
        let s = fs::read_to_string(&self.file)
            .map_err(|e| format!("Failed to read {:?}: {}", self.file, e))?;

        serde_json::from_str(&s)
            .map_err(|e| format!("Failed to deserialize: {:?}: {}\n{}", self.file, e, s))
    }
}

#[async_trait]
impl StateSource for LiveFileStates {
    async fn retrieve_states(&self, keys: &[String]) -> Result<StateSnapshot, String> {
        let states_data = match self.read_states_data() {
            Ok(data) => {
                self.last_data.update(data.clone());
                data
            }
            Err(e) => {
                let previous_data = self.last_data.get().ok_or_else(|| {
                    format!(
                        "Failed to get states ({:?}) and no last was available: {}",
                        self.file, e
                    )
                })?;
                warn!("Error reading current data: {}, using last valid", e);
                previous_data
            }
        };

        let file_age = check_age(states_data.timestamp, Utc::now(), self.max_age.as_secs() as i64);
        match file_age.age_type() {
            AgeType::Good => {
                trace!("{:?}: {}", self.file, file_age);
            }
            AgeType::GettingOld => {
                warn!("{:?}: {}", self.file, file_age);
            }
            AgeType::TooOld => {
                return Err(format!(
                    "{:?}: {} - is it being updated?",
                    self.file, file_age
                ));
            }
        };

        let mut states = HashMap::new();
        for key in keys {
            match states_data.states.get(key) {
                Some(state) => {
                    states.insert(key.clone(), state.clone());
                }
                None => error!("{:?} has no state for '{}'", self.file, key),
            }
        }
        Ok(StateSnapshot::new(states))
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct StatesFileData {
    timestamp: DateTime<Utc>,
    states: HashMap<String, String>,
}
