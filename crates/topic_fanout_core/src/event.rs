use serde::{Deserialize, Serialize};

use crate::config::FanoutConfig;
use crate::error::FanoutError;

pub const TOPIC_DETAIL_TYPE: &str = "subreddit";
pub const TOPIC_PAYLOAD_TYPE: &str = "subreddit";

/// Detail body carried by every published event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TopicPayload {
    pub fn new(name: impl Into<String>) -> Result<Self, FanoutError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FanoutError::Payload(
                "identifier cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            name,
            kind: TOPIC_PAYLOAD_TYPE.to_string(),
        })
    }
}

/// One bus entry, built fresh for each identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishedEvent {
    pub event_bus_name: String,
    pub source: String,
    pub detail_type: String,
    pub detail: String,
}

impl PublishedEvent {
    pub fn for_identifier(config: &FanoutConfig, identifier: &str) -> Result<Self, FanoutError> {
        let payload = TopicPayload::new(identifier)?;
        let detail = serde_json::to_string(&payload)
            .map_err(|error| FanoutError::Payload(error.to_string()))?;

        Ok(Self {
            event_bus_name: config.event_bus_name.clone(),
            source: config.event_source.clone(),
            detail_type: TOPIC_DETAIL_TYPE.to_string(),
            detail,
        })
    }

    pub fn payload(&self) -> Result<TopicPayload, FanoutError> {
        serde_json::from_str(&self.detail).map_err(|error| FanoutError::Payload(error.to_string()))
    }
}
