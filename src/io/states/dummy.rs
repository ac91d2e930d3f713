use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::io::dummy::{self, DummyIO};

use super::{StateSnapshot, StateSource};

pub enum ModifyState {
    SetState(String, String),
    RemoveState(String),
    /// Simulates the whole registry being unreachable.
    SetReachable(bool),
}

struct DummyRegistry {
    states: HashMap<String, String>,
    reachable: bool,
}

pub struct Dummy {
    receiver: Mutex<Receiver<ModifyState>>,
    registry: Mutex<DummyRegistry>,
}

impl DummyIO for Dummy {
    type MessageType = ModifyState;
    type Config = HashMap<String, String>;

    fn new(receiver: Receiver<Self::MessageType>, config: &Self::Config) -> Self {
        Dummy {
            receiver: Mutex::new(receiver),
            registry: Mutex::new(DummyRegistry {
                states: config.clone(),
                reachable: true,
            }),
        }
    }
}

impl Dummy {
    fn update_state(&self) -> Result<(), String> {
        let receiver = self.receiver.lock().map_err(|_| "Dummy receiver poisoned".to_owned())?;
        let mut registry = self.registry.lock().map_err(|_| "Dummy registry poisoned".to_owned())?;
        dummy::read_all(&receiver, |message| match message {
            ModifyState::SetState(key, state) => {
                registry.states.insert(key, state);
            }
            ModifyState::RemoveState(key) => {
                registry.states.remove(&key);
            }
            ModifyState::SetReachable(reachable) => registry.reachable = reachable,
        });
        Ok(())
    }
}

#[async_trait]
impl StateSource for Dummy {
    async fn retrieve_states(&self, keys: &[String]) -> Result<StateSnapshot, String> {
        self.update_state()?;
        let registry = self.registry.lock().map_err(|_| "Dummy registry poisoned".to_owned())?;
        if !registry.reachable {
            return Err("Dummy registry is unreachable".to_owned());
        }
        let states = keys
            .iter()
            .filter_map(|key| registry.states.get(key).map(|state| (key.clone(), state.clone())))
            .collect();
        Ok(StateSnapshot::new(states))
    }
}
