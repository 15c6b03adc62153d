use thiserror::Error;

/// Failures that abort a fan-out invocation.
///
/// Per-item rejections reported by the bus are not errors; they are logged
/// and counted in the invocation report instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FanoutError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to list identifiers: {0}")]
    ListRetrieval(String),

    #[error("failed to publish event for '{identifier}': {message}")]
    Transport { identifier: String, message: String },

    #[error("invalid event payload: {0}")]
    Payload(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiringError {
    #[error("{first} and {second} are mutually exclusive")]
    MutuallyExclusive {
        first: &'static str,
        second: &'static str,
    },

    #[error("either existing_function or function_props is required")]
    MissingFunction,

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("{0} cannot be empty")]
    Empty(&'static str),
}
