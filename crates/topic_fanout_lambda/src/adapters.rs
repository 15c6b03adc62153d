pub mod event_bus;
pub mod topic_table;
