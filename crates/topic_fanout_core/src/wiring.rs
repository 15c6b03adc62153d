//! Provisioning manifest for the object-created wiring:
//! storage bucket → default event bus → rule → function target.
//!
//! The target carries a bounded retry policy and a dead-letter queue, and the
//! rule is granted permission to invoke the function. Everything here is
//! declarative; deployment is left to CloudFormation.

pub mod props;
pub mod template;

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::WiringError;
pub use props::{
    BucketProps, BucketRef, FunctionProps, FunctionRef, RuleProps, TargetProps, WiringProps,
};
pub use template::{Resource, StackManifest};
use template::{attribute, reference};

pub const BUCKET_ID: &str = "TopicBucket";
pub const DEAD_LETTER_QUEUE_ID: &str = "TargetDeadLetterQueue";
pub const DEAD_LETTER_QUEUE_POLICY_ID: &str = "TargetDeadLetterQueuePolicy";
pub const FUNCTION_ROLE_ID: &str = "TargetFunctionServiceRole";
pub const FUNCTION_ID: &str = "TargetFunction";
pub const RULE_ID: &str = "ObjectCreatedRule";
pub const INVOKE_PERMISSION_ID: &str = "RuleInvokePermission";
pub const RULE_TARGET_ID: &str = "Target0";

const DEAD_LETTER_RETENTION_SECONDS: u32 = 1_209_600;
const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

pub fn build_stack(props: &WiringProps) -> Result<StackManifest, WiringError> {
    props.validate()?;

    let mut resources = Vec::new();
    let bucket_name = match &props.existing_bucket {
        Some(bucket) => json!(bucket.name),
        None => {
            let bucket_props = props.bucket_props.clone().unwrap_or_default();
            resources.push(bucket_resource(&bucket_props, props.logging_bucket.as_ref()));
            reference(BUCKET_ID)
        }
    };

    resources.push(Resource::new(
        DEAD_LETTER_QUEUE_ID,
        "AWS::SQS::Queue",
        json!({
            "MessageRetentionPeriod": DEAD_LETTER_RETENTION_SECONDS,
            "SqsManagedSseEnabled": true,
        }),
    ));

    let function_arn = match (&props.existing_function, &props.function_props) {
        (Some(function), _) => json!(function.arn),
        (None, Some(function_props)) => {
            if function_props.role_arn.is_none() {
                resources.push(function_role_resource());
            }
            resources.push(function_resource(function_props));
            attribute(FUNCTION_ID, "Arn")
        }
        (None, None) => return Err(WiringError::MissingFunction),
    };

    let rule_props = props.rule_props.clone().unwrap_or_default();
    let target_props = props.target_props.unwrap_or_default();
    resources.push(rule_resource(
        &rule_props,
        &target_props,
        &bucket_name,
        &function_arn,
    ));

    resources.push(
        Resource::new(
            DEAD_LETTER_QUEUE_POLICY_ID,
            "AWS::SQS::QueuePolicy",
            json!({
                "Queues": [reference(DEAD_LETTER_QUEUE_ID)],
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Sid": "AllowRuleDeadLetters",
                        "Effect": "Allow",
                        "Principal": { "Service": "events.amazonaws.com" },
                        "Action": "sqs:SendMessage",
                        "Resource": attribute(DEAD_LETTER_QUEUE_ID, "Arn"),
                        "Condition": {
                            "ArnEquals": { "aws:SourceArn": attribute(RULE_ID, "Arn") }
                        }
                    }]
                }
            }),
        )
        .depends_on(RULE_ID),
    );

    resources.push(Resource::new(
        INVOKE_PERMISSION_ID,
        "AWS::Lambda::Permission",
        json!({
            "Action": "lambda:InvokeFunction",
            "FunctionName": function_arn,
            "Principal": "events.amazonaws.com",
            "SourceArn": attribute(RULE_ID, "Arn"),
        }),
    ));

    let outputs = BTreeMap::from([
        ("BucketName".to_string(), bucket_name),
        ("FunctionArn".to_string(), function_arn),
        ("RuleArn".to_string(), attribute(RULE_ID, "Arn")),
        (
            "DeadLetterQueueArn".to_string(),
            attribute(DEAD_LETTER_QUEUE_ID, "Arn"),
        ),
    ]);

    Ok(StackManifest {
        description: "Object-created notifications routed to a function through the default event bus"
            .to_string(),
        resources,
        outputs,
    })
}

/// Pattern matching object-created notifications from the wired bucket.
pub fn default_event_pattern(bucket_name: &Value) -> Value {
    json!({
        "source": ["aws.s3"],
        "detail-type": ["Object Created"],
        "detail": {
            "bucket": { "name": [bucket_name] }
        }
    })
}

fn bucket_resource(bucket_props: &BucketProps, logging_bucket: Option<&BucketRef>) -> Resource {
    let mut properties = json!({
        "NotificationConfiguration": {
            "EventBridgeConfiguration": { "EventBridgeEnabled": true }
        },
        "PublicAccessBlockConfiguration": {
            "BlockPublicAcls": true,
            "BlockPublicPolicy": true,
            "IgnorePublicAcls": true,
            "RestrictPublicBuckets": true,
        },
        "BucketEncryption": {
            "ServerSideEncryptionConfiguration": [{
                "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" }
            }]
        },
    });

    if let Some(name) = &bucket_props.bucket_name {
        properties["BucketName"] = json!(name);
    }
    if bucket_props.versioned {
        properties["VersioningConfiguration"] = json!({ "Status": "Enabled" });
    }
    if let Some(logging_bucket) = logging_bucket {
        let mut logging = json!({ "DestinationBucketName": logging_bucket.name });
        if let Some(prefix) = &bucket_props.logging_prefix {
            logging["LogFilePrefix"] = json!(prefix);
        }
        properties["LoggingConfiguration"] = logging;
    }

    Resource::new(BUCKET_ID, "AWS::S3::Bucket", properties)
}

fn function_role_resource() -> Resource {
    Resource::new(
        FUNCTION_ROLE_ID,
        "AWS::IAM::Role",
        json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" },
                    "Action": "sts:AssumeRole"
                }]
            },
            "ManagedPolicyArns": [BASIC_EXECUTION_POLICY_ARN],
        }),
    )
}

fn function_resource(function_props: &FunctionProps) -> Resource {
    let role = match &function_props.role_arn {
        Some(arn) => json!(arn),
        None => attribute(FUNCTION_ROLE_ID, "Arn"),
    };

    let mut properties = json!({
        "Code": {
            "S3Bucket": function_props.code_bucket,
            "S3Key": function_props.code_key,
        },
        "Handler": function_props.handler,
        "Runtime": function_props.runtime,
        "MemorySize": function_props.memory_size,
        "Timeout": function_props.timeout_seconds,
        "Role": role,
    });

    if let Some(name) = &function_props.function_name {
        properties["FunctionName"] = json!(name);
    }
    if !function_props.environment.is_empty() {
        properties["Environment"] = json!({ "Variables": function_props.environment });
    }

    let resource = Resource::new(FUNCTION_ID, "AWS::Lambda::Function", properties);
    if function_props.role_arn.is_none() {
        resource.depends_on(FUNCTION_ROLE_ID)
    } else {
        resource
    }
}

fn rule_resource(
    rule_props: &RuleProps,
    target_props: &TargetProps,
    bucket_name: &Value,
    function_arn: &Value,
) -> Resource {
    let event_pattern = rule_props
        .event_pattern
        .clone()
        .unwrap_or_else(|| default_event_pattern(bucket_name));

    let state = if rule_props.disabled {
        "DISABLED"
    } else {
        "ENABLED"
    };

    let mut properties = json!({
        "EventBusName": "default",
        "EventPattern": event_pattern,
        "State": state,
        "Targets": [{
            "Id": RULE_TARGET_ID,
            "Arn": function_arn,
            "DeadLetterConfig": { "Arn": attribute(DEAD_LETTER_QUEUE_ID, "Arn") },
            "RetryPolicy": {
                "MaximumRetryAttempts": target_props.maximum_retry_attempts,
                "MaximumEventAgeInSeconds": target_props.maximum_event_age_seconds,
            }
        }],
    });

    if let Some(name) = &rule_props.rule_name {
        properties["Name"] = json!(name);
    }
    if let Some(description) = &rule_props.description {
        properties["Description"] = json!(description);
    }

    Resource::new(RULE_ID, "AWS::Events::Rule", properties)
}
