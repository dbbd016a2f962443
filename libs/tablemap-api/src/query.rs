use std::fmt;

use crate::filter::{FilterPredicate, Operator};

/// System property holding the partition key.
pub const PARTITION_KEY: &str = "PartitionKey";
/// System property holding the row key.
pub const ROW_KEY: &str = "RowKey";
/// System property holding the last-modified timestamp.
pub const TIMESTAMP: &str = "Timestamp";

/// Query handed to the store: partition equality, optionally combined with
/// one predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub partition_key: String,
    pub predicate: Option<FilterPredicate>,
}

impl StoreQuery {
    /// Every row of the partition.
    pub fn partition(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: FilterPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// The row with key `row_key` in the partition.
    pub fn row(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self::partition(partition_key)
            .with_predicate(FilterPredicate::new(ROW_KEY, Operator::Equal, row_key))
    }

    /// Render in the store's filter syntax:
    /// `(PartitionKey eq 'users') and (Name eq 'Bob')`.
    pub fn to_filter_string(&self) -> String {
        let partition = condition(PARTITION_KEY, Operator::Equal, &self.partition_key);
        match &self.predicate {
            None => partition,
            Some(p) => format!(
                "({partition}) and ({})",
                condition(&p.property, p.operator, &p.value)
            ),
        }
    }
}

impl fmt::Display for StoreQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter_string())
    }
}

/// `property op 'value'`, with single quotes in the value doubled.
fn condition(property: &str, operator: Operator, value: &str) -> String {
    format!(
        "{property} {} '{}'",
        operator.keyword(),
        value.replace('\'', "''")
    )
}
