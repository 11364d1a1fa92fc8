//! Storage-level change notifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted tables that announce changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Donors,
    Hospitals,
    BloodRequests,
    BloodInventory,
}

impl Table {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donors => "donors",
            Self::Hospitals => "hospitals",
            Self::BloodRequests => "blood_requests",
            Self::BloodInventory => "blood_inventory",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown table: {0}")]
pub struct ParseTableError(String);

impl FromStr for Table {
    type Err = ParseTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donors" => Ok(Self::Donors),
            "hospitals" => Ok(Self::Hospitals),
            "blood_requests" => Ok(Self::BloodRequests),
            "blood_inventory" => Ok(Self::BloodInventory),
            other => Err(ParseTableError(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

impl ChangeOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// A committed row mutation. `record` is the row after the change (before,
/// for deletes) keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub operation: ChangeOperation,
    pub record: Value,
}

impl ChangeEvent {
    pub fn new(table: Table, operation: ChangeOperation, record: Value) -> Self {
        Self {
            table,
            operation,
            record,
        }
    }
}

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

/// Which changes a subscriber wants: a table, optionally narrowed to rows
/// whose `column` equals `value`.
///
/// # Examples
/// ```
/// use bloodlink::domain::{ChangeEvent, ChangeOperation, Table, TableFilter};
/// use serde_json::json;
///
/// let filter = TableFilter::table(Table::BloodRequests).with_column("status", "pending");
/// let event = ChangeEvent::new(
///     Table::BloodRequests,
///     ChangeOperation::Insert,
///     json!({ "status": "pending" }),
/// );
/// assert!(filter.matches(&event));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableFilter {
    table: Table,
    column: Option<ColumnFilter>,
}

impl TableFilter {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            column: None,
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.column = Some(ColumnFilter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn table_name(&self) -> Table {
        self.table
    }

    pub fn column(&self) -> Option<&ColumnFilter> {
        self.column.as_ref()
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table {
            return false;
        }
        let Some(filter) = &self.column else {
            return true;
        };
        match event.record.get(&filter.column) {
            Some(Value::String(actual)) => *actual == filter.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == filter.value,
        }
    }
}

impl fmt::Display for TableFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(filter) => write!(f, "{}:{}=eq.{}", self.table, filter.column, filter.value),
            None => write!(f, "{}", self.table),
        }
    }
}
