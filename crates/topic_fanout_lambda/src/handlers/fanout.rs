use std::time::Instant;

use serde::{Deserialize, Serialize};
use topic_fanout_core::config::{FanoutConfig, IdentifierSource};
use topic_fanout_core::error::FanoutError;
use topic_fanout_core::event::PublishedEvent;
use topic_fanout_core::identifiers::{project_rows, split_static_list};

use crate::adapters::event_bus::EventPublisher;
use crate::adapters::topic_table::TopicTable;

const COMPONENT: &str = "fanout_handler";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutPhase {
    Validating,
    Listing,
    Publishing,
    Completed,
    Aborted,
}

impl FanoutPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Listing => "listing",
            Self::Publishing => "publishing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectedEntry {
    pub identifier: String,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishSummary {
    pub attempted: usize,
    pub published: usize,
    pub rejected: Vec<RejectedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FanoutReport {
    pub source: String,
    pub started_at: String,
    pub identifiers: usize,
    pub attempted: usize,
    pub published: usize,
    pub rejected: Vec<RejectedEntry>,
}

/// Runs one invocation: validate, list, then publish one event per identifier.
///
/// Configuration, listing, and transport failures abort the run. Entries the
/// bus rejects are logged and reported but do not fail the invocation.
pub fn handle_fanout(
    config: &FanoutConfig,
    table: &impl TopicTable,
    publisher: &impl EventPublisher,
) -> Result<FanoutReport, FanoutError> {
    let started = Instant::now();
    let started_at = chrono::Utc::now().to_rfc3339();
    tracing::info!(
        component = COMPONENT,
        event = "fanout_started",
        phase = FanoutPhase::Validating.as_str(),
        "fan-out invocation started"
    );

    config
        .validate()
        .map_err(|error| aborted(FanoutPhase::Validating, "config_invalid", error))?;
    let source = config
        .identifier_source()
        .map_err(|error| aborted(FanoutPhase::Validating, "config_invalid", error))?;
    tracing::info!(
        component = COMPONENT,
        event = "config_validated",
        event_bus_name = %config.event_bus_name,
        source = source.kind(),
        "configuration validated"
    );

    let identifiers = list_identifiers(&source, table)
        .map_err(|error| aborted(FanoutPhase::Listing, "list_failed", error))?;
    tracing::info!(
        component = COMPONENT,
        event = "identifiers_listed",
        phase = FanoutPhase::Publishing.as_str(),
        source = source.kind(),
        count = identifiers.len(),
        "identifier list ready"
    );

    let summary = publish_all(config, &identifiers, publisher)
        .map_err(|error| aborted(FanoutPhase::Publishing, "fanout_aborted", error))?;

    tracing::info!(
        component = COMPONENT,
        event = "fanout_completed",
        phase = FanoutPhase::Completed.as_str(),
        attempted = summary.attempted,
        published = summary.published,
        rejected = summary.rejected.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "fan-out invocation completed"
    );

    Ok(FanoutReport {
        source: source.kind().to_string(),
        started_at,
        identifiers: identifiers.len(),
        attempted: summary.attempted,
        published: summary.published,
        rejected: summary.rejected,
    })
}

/// Produces the ordered identifier list for the selected source.
///
/// The table strategy issues exactly one scan call; a truncated scan is
/// reported with a warning rather than paginated.
pub fn list_identifiers(
    source: &IdentifierSource<'_>,
    table: &impl TopicTable,
) -> Result<Vec<String>, FanoutError> {
    match source {
        IdentifierSource::StaticList(raw) => Ok(split_static_list(raw)),
        IdentifierSource::Table {
            table_name,
            attribute,
        } => {
            let scan = table
                .scan_attribute(table_name, attribute)
                .map_err(FanoutError::ListRetrieval)?;

            if scan.truncated {
                tracing::warn!(
                    component = COMPONENT,
                    event = "scan_truncated",
                    table_name = %table_name,
                    rows = scan.rows.len(),
                    "table scan returned a partial result; remaining pages are not read"
                );
            }

            let projected = project_rows(scan.rows);
            if projected.skipped_rows > 0 {
                tracing::warn!(
                    component = COMPONENT,
                    event = "rows_skipped",
                    table_name = %table_name,
                    attribute = %attribute,
                    skipped = projected.skipped_rows,
                    "rows without a string identifier were skipped"
                );
            }

            Ok(projected.identifiers)
        }
    }
}

/// Publishes identifiers strictly in order, one event per call.
pub fn publish_all(
    config: &FanoutConfig,
    identifiers: &[String],
    publisher: &impl EventPublisher,
) -> Result<PublishSummary, FanoutError> {
    let mut summary = PublishSummary::default();

    for identifier in identifiers {
        let event = PublishedEvent::for_identifier(config, identifier)?;
        summary.attempted += 1;

        let outcome = publisher.put_event(&event).map_err(|message| {
            tracing::error!(
                component = COMPONENT,
                event = "publish_failed",
                identifier = %identifier,
                error = %message,
                "event bus call failed"
            );
            FanoutError::Transport {
                identifier: identifier.clone(),
                message,
            }
        })?;

        if outcome.is_rejected() {
            tracing::error!(
                component = COMPONENT,
                event = "event_rejected",
                identifier = %identifier,
                failed_entry_count = outcome.failed_entry_count,
                error_code = outcome.error_code.as_deref().unwrap_or("unknown"),
                error_message = outcome.error_message.as_deref().unwrap_or(""),
                "event bus rejected entry"
            );
            summary.rejected.push(RejectedEntry {
                identifier: identifier.clone(),
                error_code: outcome.error_code,
                error_message: outcome.error_message,
            });
            continue;
        }

        tracing::debug!(
            component = COMPONENT,
            event = "event_published",
            identifier = %identifier,
            "event published"
        );
        summary.published += 1;
    }

    Ok(summary)
}

fn aborted(phase: FanoutPhase, event: &'static str, error: FanoutError) -> FanoutError {
    tracing::error!(
        component = COMPONENT,
        event = event,
        phase = phase.as_str(),
        next_phase = FanoutPhase::Aborted.as_str(),
        error = %error,
        "fan-out invocation aborted"
    );
    error
}
