use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WiringError;

pub const DEFAULT_MAXIMUM_RETRY_ATTEMPTS: u32 = 2;
pub const MAX_RETRY_ATTEMPTS: u32 = 185;
pub const DEFAULT_MAXIMUM_EVENT_AGE_SECONDS: u32 = 3_600;
pub const MIN_EVENT_AGE_SECONDS: u32 = 60;
pub const MAX_EVENT_AGE_SECONDS: u32 = 86_400;

/// Provisioning-time inputs for the bucket → rule → function wiring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WiringProps {
    #[serde(default)]
    pub existing_bucket: Option<BucketRef>,
    #[serde(default)]
    pub bucket_props: Option<BucketProps>,
    #[serde(default)]
    pub existing_function: Option<FunctionRef>,
    #[serde(default)]
    pub function_props: Option<FunctionProps>,
    #[serde(default)]
    pub rule_props: Option<RuleProps>,
    #[serde(default)]
    pub target_props: Option<TargetProps>,
    #[serde(default)]
    pub logging_bucket: Option<BucketRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketRef {
    pub name: String,
}

impl BucketRef {
    pub fn arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionRef {
    pub arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketProps {
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default = "default_true")]
    pub versioned: bool,
    #[serde(default)]
    pub logging_prefix: Option<String>,
}

impl Default for BucketProps {
    fn default() -> Self {
        Self {
            bucket_name: None,
            versioned: true,
            logging_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionProps {
    pub code_bucket: String,
    pub code_key: String,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default = "default_runtime")]
    pub runtime: String,
    #[serde(default = "default_handler")]
    pub handler: String,
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u32,
    #[serde(default)]
    pub role_arn: Option<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleProps {
    #[serde(default)]
    pub rule_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Replaces the default object-created pattern when present.
    #[serde(default)]
    pub event_pattern: Option<Value>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetProps {
    #[serde(default = "default_maximum_retry_attempts")]
    pub maximum_retry_attempts: u32,
    #[serde(default = "default_maximum_event_age_seconds")]
    pub maximum_event_age_seconds: u32,
}

impl Default for TargetProps {
    fn default() -> Self {
        Self {
            maximum_retry_attempts: DEFAULT_MAXIMUM_RETRY_ATTEMPTS,
            maximum_event_age_seconds: DEFAULT_MAXIMUM_EVENT_AGE_SECONDS,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_runtime() -> String {
    "provided.al2023".to_string()
}

fn default_handler() -> String {
    "bootstrap".to_string()
}

fn default_memory_size() -> u32 {
    128
}

fn default_timeout_seconds() -> u32 {
    30
}

fn default_maximum_retry_attempts() -> u32 {
    DEFAULT_MAXIMUM_RETRY_ATTEMPTS
}

fn default_maximum_event_age_seconds() -> u32 {
    DEFAULT_MAXIMUM_EVENT_AGE_SECONDS
}

impl WiringProps {
    pub fn validate(&self) -> Result<(), WiringError> {
        if self.existing_bucket.is_some() && self.bucket_props.is_some() {
            return Err(WiringError::MutuallyExclusive {
                first: "existing_bucket",
                second: "bucket_props",
            });
        }

        if self.existing_bucket.is_some() && self.logging_bucket.is_some() {
            return Err(WiringError::MutuallyExclusive {
                first: "existing_bucket",
                second: "logging_bucket",
            });
        }

        match (&self.existing_function, &self.function_props) {
            (Some(_), Some(_)) => Err(WiringError::MutuallyExclusive {
                first: "existing_function",
                second: "function_props",
            }),
            (None, None) => Err(WiringError::MissingFunction),
            (Some(function), None) => non_empty("existing_function.arn", &function.arn),
            (None, Some(props)) => props.validate(),
        }?;

        if let Some(bucket) = &self.existing_bucket {
            non_empty("existing_bucket.name", &bucket.name)?;
        }
        if let Some(bucket) = &self.logging_bucket {
            non_empty("logging_bucket.name", &bucket.name)?;
        }

        self.target_props.unwrap_or_default().validate()
    }
}

impl FunctionProps {
    fn validate(&self) -> Result<(), WiringError> {
        non_empty("function_props.code_bucket", &self.code_bucket)?;
        non_empty("function_props.code_key", &self.code_key)?;
        in_range("function_props.memory_size", self.memory_size, 128, 10_240)?;
        in_range("function_props.timeout_seconds", self.timeout_seconds, 1, 900)
    }
}

impl TargetProps {
    fn validate(&self) -> Result<(), WiringError> {
        in_range(
            "target_props.maximum_retry_attempts",
            self.maximum_retry_attempts,
            0,
            MAX_RETRY_ATTEMPTS,
        )?;
        in_range(
            "target_props.maximum_event_age_seconds",
            self.maximum_event_age_seconds,
            MIN_EVENT_AGE_SECONDS,
            MAX_EVENT_AGE_SECONDS,
        )
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), WiringError> {
    if value.trim().is_empty() {
        Err(WiringError::Empty(field))
    } else {
        Ok(())
    }
}

fn in_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), WiringError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(WiringError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
