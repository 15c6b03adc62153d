use topic_fanout_core::event::PublishedEvent;

/// What the bus reported for a single-entry put.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutEventOutcome {
    pub failed_entry_count: usize,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl PutEventOutcome {
    pub fn accepted() -> Self {
        Self::default()
    }

    pub fn rejected(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            failed_entry_count: 1,
            error_code: Some(error_code.into()),
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.failed_entry_count > 0
    }
}

/// `Err` means the call itself failed; a logical rejection comes back as
/// `Ok` with a non-zero failed entry count.
pub trait EventPublisher {
    fn put_event(&self, event: &PublishedEvent) -> Result<PutEventOutcome, String>;
}
