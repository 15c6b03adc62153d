/// Result of a single scan call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableScan {
    /// The requested attribute per row, in scan order; `None` when the row
    /// has no string value for it.
    pub rows: Vec<Option<String>>,
    /// Set when the table reported more pages than the one returned.
    pub truncated: bool,
}

pub trait TopicTable {
    fn scan_attribute(&self, table_name: &str, attribute: &str) -> Result<TableScan, String>;
}
