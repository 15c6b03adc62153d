#![allow(dead_code)]

use std::sync::Mutex;

use topic_fanout_core::config::FanoutConfig;
use topic_fanout_core::event::PublishedEvent;
use topic_fanout_lambda::adapters::event_bus::{EventPublisher, PutEventOutcome};
use topic_fanout_lambda::adapters::topic_table::{TableScan, TopicTable};

pub fn scenario_config() -> FanoutConfig {
    FanoutConfig {
        event_bus_name: "bus1".to_string(),
        event_source: "ns1".to_string(),
        table_name: "t1".to_string(),
        use_table: false,
        static_list: Some("sub1,sub2".to_string()),
        table_attribute: "name".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusBehavior {
    Accept,
    Reject,
    Fail,
}

/// Event bus double that records every call and answers per call index.
pub struct ScriptedBus {
    calls: Mutex<Vec<PublishedEvent>>,
    script: Box<dyn Fn(usize) -> BusBehavior + Send + Sync>,
}

impl ScriptedBus {
    pub fn accepting() -> Self {
        Self::scripted(|_| BusBehavior::Accept)
    }

    pub fn scripted(script: impl Fn(usize) -> BusBehavior + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        }
    }

    pub fn calls(&self) -> Vec<PublishedEvent> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("poisoned mutex").len()
    }
}

impl EventPublisher for ScriptedBus {
    fn put_event(&self, event: &PublishedEvent) -> Result<PutEventOutcome, String> {
        let mut calls = self.calls.lock().expect("poisoned mutex");
        calls.push(event.clone());
        // 1-indexed call number
        match (self.script)(calls.len()) {
            BusBehavior::Accept => Ok(PutEventOutcome::accepted()),
            BusBehavior::Reject => Ok(PutEventOutcome::rejected(
                "InternalFailure",
                "entry could not be stored",
            )),
            BusBehavior::Fail => Err("connection reset by peer".to_string()),
        }
    }
}

pub struct RecordingTable {
    rows: Result<Vec<Option<String>>, String>,
    scans: Mutex<Vec<(String, String)>>,
}

impl RecordingTable {
    pub fn with_rows(rows: &[&str]) -> Self {
        Self {
            rows: Ok(rows.iter().map(|row| Some(row.to_string())).collect()),
            scans: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            rows: Err(message.to_string()),
            scans: Mutex::new(Vec::new()),
        }
    }

    pub fn scans(&self) -> Vec<(String, String)> {
        self.scans.lock().expect("poisoned mutex").clone()
    }
}

impl TopicTable for RecordingTable {
    fn scan_attribute(&self, table_name: &str, attribute: &str) -> Result<TableScan, String> {
        self.scans
            .lock()
            .expect("poisoned mutex")
            .push((table_name.to_string(), attribute.to_string()));

        self.rows.clone().map(|rows| TableScan {
            rows,
            truncated: false,
        })
    }
}
