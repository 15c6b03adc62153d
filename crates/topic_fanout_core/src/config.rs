use serde::{Deserialize, Serialize};

use crate::error::FanoutError;

pub const EVENT_BUS_NAME_VAR: &str = "EVENT_BUS_NAME";
pub const EVENT_SOURCE_VAR: &str = "EVENT_SOURCE";
pub const TOPIC_TABLE_NAME_VAR: &str = "TOPIC_TABLE_NAME";
pub const USE_TOPIC_TABLE_VAR: &str = "USE_TOPIC_TABLE";
pub const TOPIC_LIST_VAR: &str = "TOPIC_LIST";
pub const TOPIC_TABLE_ATTRIBUTE_VAR: &str = "TOPIC_TABLE_ATTRIBUTE";

pub const DEFAULT_TABLE_ATTRIBUTE: &str = "name";

/// Process-wide fan-out settings, read once per invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FanoutConfig {
    #[serde(default)]
    pub event_bus_name: String,
    #[serde(default)]
    pub event_source: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub use_table: bool,
    #[serde(default)]
    pub static_list: Option<String>,
    #[serde(default = "default_table_attribute")]
    pub table_attribute: String,
}

/// Where the identifier list comes from for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSource<'a> {
    Table {
        table_name: &'a str,
        attribute: &'a str,
    },
    StaticList(&'a str),
}

impl IdentifierSource<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table { .. } => "table",
            Self::StaticList(_) => "static_list",
        }
    }
}

pub fn default_table_attribute() -> String {
    DEFAULT_TABLE_ATTRIBUTE.to_string()
}

impl FanoutConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing keys become
    /// empty values; nothing is validated here.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let table_attribute = lookup(TOPIC_TABLE_ATTRIBUTE_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(default_table_attribute);

        Self {
            event_bus_name: lookup(EVENT_BUS_NAME_VAR).unwrap_or_default(),
            event_source: lookup(EVENT_SOURCE_VAR).unwrap_or_default(),
            table_name: lookup(TOPIC_TABLE_NAME_VAR).unwrap_or_default(),
            use_table: lookup(USE_TOPIC_TABLE_VAR)
                .as_deref()
                .map(parse_switch)
                .unwrap_or(false),
            static_list: lookup(TOPIC_LIST_VAR),
            table_attribute,
        }
    }

    pub fn validate(&self) -> Result<(), FanoutError> {
        let missing: Vec<&str> = [
            (EVENT_BUS_NAME_VAR, &self.event_bus_name),
            (EVENT_SOURCE_VAR, &self.event_source),
            (TOPIC_TABLE_NAME_VAR, &self.table_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FanoutError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn identifier_source(&self) -> Result<IdentifierSource<'_>, FanoutError> {
        if self.use_table {
            return Ok(IdentifierSource::Table {
                table_name: &self.table_name,
                attribute: &self.table_attribute,
            });
        }

        match self.static_list.as_deref() {
            Some(list) if !list.trim().is_empty() => Ok(IdentifierSource::StaticList(list)),
            _ => Err(FanoutError::Config(format!(
                "no identifier source configured: {USE_TOPIC_TABLE_VAR} is off and {TOPIC_LIST_VAR} is empty"
            ))),
        }
    }
}

fn parse_switch(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    fn valid_config() -> FanoutConfig {
        FanoutConfig::from_lookup(lookup_from(&[
            (EVENT_BUS_NAME_VAR, "bus1"),
            (EVENT_SOURCE_VAR, "ns1"),
            (TOPIC_TABLE_NAME_VAR, "t1"),
            (TOPIC_LIST_VAR, "sub1,sub2"),
        ]))
    }

    #[test]
    fn from_lookup_reads_all_settings() {
        let config = FanoutConfig::from_lookup(lookup_from(&[
            (EVENT_BUS_NAME_VAR, "bus1"),
            (EVENT_SOURCE_VAR, "ns1"),
            (TOPIC_TABLE_NAME_VAR, "t1"),
            (USE_TOPIC_TABLE_VAR, "TRUE"),
            (TOPIC_LIST_VAR, "a,b"),
            (TOPIC_TABLE_ATTRIBUTE_VAR, "subreddit"),
        ]));

        assert_eq!(config.event_bus_name, "bus1");
        assert_eq!(config.event_source, "ns1");
        assert_eq!(config.table_name, "t1");
        assert!(config.use_table);
        assert_eq!(config.static_list.as_deref(), Some("a,b"));
        assert_eq!(config.table_attribute, "subreddit");
    }

    #[test]
    fn table_switch_defaults_to_off() {
        let config = valid_config();
        assert!(!config.use_table);
        assert_eq!(config.table_attribute, DEFAULT_TABLE_ATTRIBUTE);
    }

    #[test]
    fn table_switch_accepts_common_truthy_values() {
        for value in ["true", "1", "yes", "On", " TRUE "] {
            assert!(parse_switch(value), "{value} should enable the table");
        }
        for value in ["false", "0", "", "enabled", "no"] {
            assert!(!parse_switch(value), "{value} should not enable the table");
        }
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert_eq!(valid_config().validate(), Ok(()));
    }

    #[test]
    fn validate_names_every_missing_setting() {
        let config = FanoutConfig::from_lookup(lookup_from(&[(EVENT_SOURCE_VAR, "ns1")]));
        let error = config.validate().expect_err("config should be rejected");

        assert_eq!(
            error,
            FanoutError::Config(
                "missing required settings: EVENT_BUS_NAME, TOPIC_TABLE_NAME".to_string()
            )
        );
    }

    #[test]
    fn validate_treats_whitespace_as_missing() {
        let mut config = valid_config();
        config.event_source = "   ".to_string();

        assert!(matches!(config.validate(), Err(FanoutError::Config(_))));
    }

    #[test]
    fn identifier_source_prefers_table_when_switch_is_on() {
        let mut config = valid_config();
        config.use_table = true;

        assert_eq!(
            config.identifier_source().expect("source should resolve"),
            IdentifierSource::Table {
                table_name: "t1",
                attribute: "name",
            }
        );
    }

    #[test]
    fn identifier_source_uses_static_list_when_switch_is_off() {
        let config = valid_config();
        let source = config.identifier_source().expect("source should resolve");

        assert_eq!(source, IdentifierSource::StaticList("sub1,sub2"));
        assert_eq!(source.kind(), "static_list");
    }

    #[test]
    fn identifier_source_rejects_missing_static_list() {
        let mut config = valid_config();
        config.static_list = None;
        assert!(matches!(
            config.identifier_source(),
            Err(FanoutError::Config(_))
        ));

        config.static_list = Some(" ".to_string());
        assert!(matches!(
            config.identifier_source(),
            Err(FanoutError::Config(_))
        ));
    }

    #[test]
    fn deserializes_from_json_with_defaults() {
        let config: FanoutConfig = serde_json::from_str(
            r#"{"event_bus_name":"bus1","event_source":"ns1","table_name":"t1"}"#,
        )
        .expect("config should parse");

        assert!(!config.use_table);
        assert_eq!(config.static_list, None);
        assert_eq!(config.table_attribute, "name");
    }
}
