use std::fmt::{Display, Formatter};
use std::time::Duration;

use log::*;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::HomeAssistantConfig;

/// State of one entity, as returned by `GET /api/states/<entity_id>`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Body of `POST /api/states/<entity_id>`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub state: String,
    pub attributes: Map<String, Value>,
}

#[derive(Debug)]
pub enum HomeAssistantError {
    Network(reqwest::Error),
    Json(reqwest::Error),
    Status(StatusCode, String),
}

impl Display for HomeAssistantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self {
            HomeAssistantError::Network(e) => write!(f, "Network Error: {}", e),
            HomeAssistantError::Json(e) => write!(f, "Deserialization Error: {}", e),
            HomeAssistantError::Status(status, body) => write!(f, "Unexpected status {}: {}", status, body),
        }
    }
}

impl std::error::Error for HomeAssistantError {}

/// Minimal client for the Home Assistant REST API.
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: Client,
}

impl HomeAssistantClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &HomeAssistantConfig) -> Result<Self, String> {
        let token = config.get_token()?;
        info!("Using Home Assistant at {}", config.get_url());
        Ok(Self::new(config.get_url(), token))
    }

    /// `Ok(None)` when the entity does not exist.
    pub async fn get_state(&self, entity_id: &str) -> Result<Option<EntityState>, HomeAssistantError> {
        let response = self
            .new_request(Method::GET, &format!("api/states/{}", entity_id))
            .send()
            .await
            .map_err(HomeAssistantError::Network)?;

        match response.status() {
            StatusCode::OK => {
                let state = response.json::<EntityState>().await.map_err(HomeAssistantError::Json)?;
                trace!("{} = '{}'", entity_id, state.state);
                Ok(Some(state))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(HomeAssistantError::Status(status, body))
            }
        }
    }

    /// Creates or replaces the state of an entity.
    pub async fn set_state(&self, entity_id: &str, update: &StateUpdate) -> Result<(), HomeAssistantError> {
        let response = self
            .new_request(Method::POST, &format!("api/states/{}", entity_id))
            .json(update)
            .send()
            .await
            .map_err(HomeAssistantError::Network)?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(HomeAssistantError::Status(status, body))
            }
        }
    }

    fn new_request(&self, method: Method, location: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, location))
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(10))
    }
}
