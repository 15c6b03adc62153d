use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_eventbridge::operation::put_events::PutEventsOutput;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use topic_fanout_core::config::FanoutConfig;
use topic_fanout_core::event::PublishedEvent;
use topic_fanout_lambda::adapters::event_bus::{EventPublisher, PutEventOutcome};
use topic_fanout_lambda::adapters::topic_table::{TableScan, TopicTable};
use topic_fanout_lambda::handlers::fanout::handle_fanout;
use tracing_subscriber::EnvFilter;

struct EventBridgePublisher {
    client: aws_sdk_eventbridge::Client,
}

impl EventPublisher for EventBridgePublisher {
    fn put_event(&self, event: &PublishedEvent) -> Result<PutEventOutcome, String> {
        let entry = request_entry(event);
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_events()
                    .entries(entry)
                    .send()
                    .await
                    .map(|output| put_outcome(&output))
                    .map_err(|error| {
                        format!(
                            "failed to put event: {}",
                            aws_sdk_eventbridge::error::DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }
}

struct DynamoTopicTable {
    client: aws_sdk_dynamodb::Client,
}

impl TopicTable for DynamoTopicTable {
    fn scan_attribute(&self, table_name: &str, attribute: &str) -> Result<TableScan, String> {
        let table = table_name.to_string();
        let attribute_name = attribute.to_string();
        let client = self.client.clone();

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .scan()
                    .table_name(table)
                    .projection_expression("#identifier")
                    .expression_attribute_names("#identifier", attribute_name)
                    .send()
                    .await
                    .map_err(|error| {
                        format!(
                            "failed to scan topic table: {}",
                            aws_sdk_dynamodb::error::DisplayErrorContext(&error)
                        )
                    })
            })
        })?;

        Ok(TableScan {
            rows: output
                .items()
                .iter()
                .map(|item| string_attribute(item, attribute))
                .collect(),
            truncated: output.last_evaluated_key().is_some(),
        })
    }
}

struct RuntimeDependencies {
    config: FanoutConfig,
    publisher: EventBridgePublisher,
    table: DynamoTopicTable,
}

fn request_entry(event: &PublishedEvent) -> PutEventsRequestEntry {
    PutEventsRequestEntry::builder()
        .event_bus_name(&event.event_bus_name)
        .source(&event.source)
        .detail_type(&event.detail_type)
        .detail(&event.detail)
        .build()
}

fn put_outcome(output: &PutEventsOutput) -> PutEventOutcome {
    let failed_entry = output
        .entries()
        .iter()
        .find(|entry| entry.error_code().is_some());

    PutEventOutcome {
        failed_entry_count: usize::try_from(output.failed_entry_count()).unwrap_or(0),
        error_code: failed_entry
            .and_then(|entry| entry.error_code())
            .map(str::to_string),
        error_message: failed_entry
            .and_then(|entry| entry.error_message())
            .map(str::to_string),
    }
}

fn string_attribute(item: &HashMap<String, AttributeValue>, attribute: &str) -> Option<String> {
    item.get(attribute)
        .and_then(|value| value.as_s().ok())
        .cloned()
}

async fn handle_request(
    _event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<(), Error> {
    handle_fanout(&deps.config, &deps.table, &deps.publisher)
        .map(|_| ())
        .map_err(Error::from)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // CloudWatch records ingestion time for every line.
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config: FanoutConfig::from_env(),
        publisher: EventBridgePublisher {
            client: aws_sdk_eventbridge::Client::new(&aws_config),
        },
        table: DynamoTopicTable {
            client: aws_sdk_dynamodb::Client::new(&aws_config),
        },
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}

#[cfg(test)]
mod tests {
    use aws_sdk_eventbridge::types::PutEventsResultEntry;

    use super::*;

    fn sample_event() -> PublishedEvent {
        PublishedEvent {
            event_bus_name: "bus1".to_string(),
            source: "ns1".to_string(),
            detail_type: "subreddit".to_string(),
            detail: r#"{"name":"sub1","type":"subreddit"}"#.to_string(),
        }
    }

    #[test]
    fn request_entry_copies_every_event_field() {
        let entry = request_entry(&sample_event());

        assert_eq!(entry.event_bus_name(), Some("bus1"));
        assert_eq!(entry.source(), Some("ns1"));
        assert_eq!(entry.detail_type(), Some("subreddit"));
        assert_eq!(entry.detail(), Some(r#"{"name":"sub1","type":"subreddit"}"#));
    }

    #[test]
    fn accepted_output_maps_to_accepted_outcome() {
        let output = PutEventsOutput::builder()
            .failed_entry_count(0)
            .entries(PutEventsResultEntry::builder().event_id("evt-1").build())
            .build();

        assert_eq!(put_outcome(&output), PutEventOutcome::accepted());
    }

    #[test]
    fn failed_entry_maps_to_rejected_outcome() {
        let output = PutEventsOutput::builder()
            .failed_entry_count(1)
            .entries(
                PutEventsResultEntry::builder()
                    .error_code("InternalFailure")
                    .error_message("entry could not be stored")
                    .build(),
            )
            .build();

        let outcome = put_outcome(&output);
        assert!(outcome.is_rejected());
        assert_eq!(
            outcome,
            PutEventOutcome::rejected("InternalFailure", "entry could not be stored")
        );
    }

    #[test]
    fn reads_string_attribute_only() {
        let item = HashMap::from([
            ("name".to_string(), AttributeValue::S("rust".to_string())),
            ("rank".to_string(), AttributeValue::N("3".to_string())),
        ]);

        assert_eq!(string_attribute(&item, "name"), Some("rust".to_string()));
        assert_eq!(string_attribute(&item, "rank"), None);
        assert_eq!(string_attribute(&item, "missing"), None);
    }
}
