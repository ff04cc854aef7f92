use crate::{AsValue, ColumnDescriptor, ColumnLayout, Result, Value};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use std::{fmt, sync::Arc};
use uuid::Uuid;

/// Forward only reader over the result sets returned by one command.
///
/// This is the capability the engine consumes from the data access layer: the
/// cursor starts positioned on the first result set, before its first row.
/// Implementations exist for real providers outside of this crate;
/// [`MemoryCursor`](crate::MemoryCursor) is the in-memory one.
pub trait Cursor: Send {
    /// Number of columns of the current result set.
    fn field_count(&self) -> usize;
    fn name(&self, ordinal: usize) -> Result<&str>;
    /// Empty value of the declared type of the column.
    fn declared_type(&self, ordinal: usize) -> Result<Value>;
    fn is_null(&self, ordinal: usize) -> Result<bool>;
    /// The cell at `ordinal` of the current row. Nulls are returned typed.
    fn value(&self, ordinal: usize) -> Result<Value>;
    /// Moves to the next row of the current result set, `false` when exhausted.
    fn advance_row(&mut self) -> Result<bool>;
    /// Moves to the next result set, `false` when there are no more.
    fn advance_result_set(&mut self) -> Result<bool>;
    fn advance_row_async(&mut self) -> BoxFuture<'_, Result<bool>>;
    fn advance_result_set_async(&mut self) -> BoxFuture<'_, Result<bool>>;
    /// Handle able to cancel the command from another thread while it is running.
    fn cancel_handle(&self) -> CancelHandle;
    /// Output and return parameters, available once every result set was read.
    fn output_parameters(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    fn columns(&self) -> Result<ColumnLayout> {
        let columns = (0..self.field_count())
            .map(|i| Ok(ColumnDescriptor::new(self.name(i)?, i, self.declared_type(i)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ColumnLayout::new(columns))
    }

    fn get_bool(&self, ordinal: usize) -> Result<bool> {
        bool::try_from_value(self.value(ordinal)?)
    }
    fn get_i32(&self, ordinal: usize) -> Result<i32> {
        i32::try_from_value(self.value(ordinal)?)
    }
    fn get_i64(&self, ordinal: usize) -> Result<i64> {
        i64::try_from_value(self.value(ordinal)?)
    }
    fn get_f64(&self, ordinal: usize) -> Result<f64> {
        f64::try_from_value(self.value(ordinal)?)
    }
    fn get_decimal(&self, ordinal: usize) -> Result<Decimal> {
        Decimal::try_from_value(self.value(ordinal)?)
    }
    fn get_string(&self, ordinal: usize) -> Result<String> {
        String::try_from_value(self.value(ordinal)?)
    }
    fn get_uuid(&self, ordinal: usize) -> Result<Uuid> {
        Uuid::try_from_value(self.value(ordinal)?)
    }
}

/// Cancels the command behind a cursor.
#[derive(Clone)]
pub struct CancelHandle(Arc<dyn Fn() + Send + Sync>);

impl CancelHandle {
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(cancel))
    }
    /// For commands that cannot be interrupted.
    pub fn noop() -> Self {
        Self::new(|| {})
    }
    pub fn cancel(&self) {
        (self.0)()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelHandle")
    }
}
