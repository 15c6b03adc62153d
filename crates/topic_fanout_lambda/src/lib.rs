//! AWS-oriented adapters and handlers for the topic fan-out publisher.
//!
//! This crate owns runtime integration details (the Lambda handler and the
//! bus/table adapter seams). Configuration, identifier shaping, and the event
//! contract live in `topic_fanout_core`.

pub mod adapters;
pub mod handlers;
