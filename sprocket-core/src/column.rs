use crate::{RowNames, Value};
use std::{ops::Deref, sync::Arc};

/// Name, position and declared type of a column of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ordinal: usize,
    /// Empty value of the declared type.
    pub declared: Value,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, ordinal: usize, declared: Value) -> Self {
        Self {
            name: name.into(),
            ordinal,
            declared: declared.as_empty(),
        }
    }
}

/// The columns of one result set, immutable once read from the cursor.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    columns: Arc<[ColumnDescriptor]>,
    names: RowNames,
}

impl ColumnLayout {
    pub fn new(columns: impl IntoIterator<Item = ColumnDescriptor>) -> Self {
        let columns: Arc<[ColumnDescriptor]> = columns.into_iter().collect();
        let names = columns.iter().map(|c| c.name.clone()).collect();
        Self { columns, names }
    }

    /// Column names, shareable with the rows produced from this layout.
    pub fn names(&self) -> &RowNames {
        &self.names
    }

    /// Ordinal of the column called `name`. An exact match wins, otherwise the first
    /// column whose name matches ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })
    }
}

impl Deref for ColumnLayout {
    type Target = [ColumnDescriptor];
    fn deref(&self) -> &Self::Target {
        &self.columns
    }
}
