use crate::{AsValue, Result, Value};
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels: the schema-less record the
/// dynamic factory produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .or_else(|| self.labels.iter().position(|v| v.eq_ignore_ascii_case(name)))
            .map(|i| &self.values()[i])
    }
    /// Reads the column `name` as `T`. The cell must already have the type of `T`.
    pub fn get<T: AsValue>(&self, name: &str) -> Result<T> {
        let value = self.get_column(name).ok_or_else(|| {
            crate::Error::msg(format!("Column `{name}` does not exist in the row provided"))
        })?;
        T::try_from_value(value.clone())
    }
}
