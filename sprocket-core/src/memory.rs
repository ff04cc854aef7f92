use crate::{CancelHandle, ColumnDescriptor, Cursor, Error, Result, Value};
use futures::future::BoxFuture;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

/// One result set held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultSet {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Value>>,
}

impl MemoryResultSet {
    /// Columns are given as name and declared type (an empty value).
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, Value)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .enumerate()
                .map(|(i, (name, declared))| ColumnDescriptor::new(name, i, declared))
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.rows.push(values.into_iter().collect());
        self
    }

    pub fn rows<R>(mut self, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = Value>,
    {
        self.rows
            .extend(rows.into_iter().map(|r| r.into_iter().collect()));
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A [`Cursor`] over result sets kept in memory.
///
/// Counts the row reads it serves and honors cancellation like a real command would:
/// once cancelled every further read fails.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    sets: Vec<MemoryResultSet>,
    set: usize,
    row: Option<usize>,
    outputs: Vec<(String, Value)>,
    delay: Option<Duration>,
    row_reads: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl MemoryCursor {
    pub fn new(sets: impl IntoIterator<Item = MemoryResultSet>) -> Self {
        Self {
            sets: sets.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Output or return parameter exposed after the result sets.
    pub fn with_output(mut self, name: impl Into<String>, value: Value) -> Self {
        self.outputs.push((name.into(), value));
        self
    }

    /// Waits before serving each row, simulating a slow command.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls to the row advance operations so far.
    pub fn row_reads(&self) -> usize {
        self.row_reads.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn current(&self) -> Option<&MemoryResultSet> {
        self.sets.get(self.set)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::msg("Operation cancelled by user"));
        }
        Ok(())
    }

    fn column(&self, ordinal: usize) -> Result<&ColumnDescriptor> {
        self.current()
            .and_then(|s| s.columns.get(ordinal))
            .ok_or_else(|| Error::msg(format!("Column ordinal {ordinal} is out of range")))
    }

    fn step_row(&mut self) -> Result<bool> {
        self.ensure_running()?;
        let Some(len) = self.current().map(|s| s.rows.len()) else {
            return Ok(false);
        };
        let next = self.row.map_or(0, |v| v + 1);
        self.row = Some(next.min(len));
        Ok(next < len)
    }

    fn step_result_set(&mut self) -> Result<bool> {
        self.ensure_running()?;
        self.set = (self.set + 1).min(self.sets.len());
        self.row = None;
        Ok(self.set < self.sets.len())
    }
}

impl Cursor for MemoryCursor {
    fn field_count(&self) -> usize {
        self.current().map_or(0, |s| s.columns.len())
    }

    fn name(&self, ordinal: usize) -> Result<&str> {
        Ok(&self.column(ordinal)?.name)
    }

    fn declared_type(&self, ordinal: usize) -> Result<Value> {
        Ok(self.column(ordinal)?.declared.clone())
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.value(ordinal)?.is_null())
    }

    fn value(&self, ordinal: usize) -> Result<Value> {
        let declared = &self.column(ordinal)?.declared;
        let value = self
            .current()
            .zip(self.row)
            .and_then(|(s, r)| s.rows.get(r))
            .ok_or_else(|| Error::msg("The cursor is not positioned on a row"))?
            .get(ordinal)
            .ok_or_else(|| Error::msg(format!("The row has no value at ordinal {ordinal}")))?;
        Ok(if value.is_null() {
            declared.clone()
        } else {
            value.clone()
        })
    }

    fn advance_row(&mut self) -> Result<bool> {
        self.row_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.step_row()
    }

    fn advance_result_set(&mut self) -> Result<bool> {
        self.step_result_set()
    }

    fn advance_row_async(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            self.row_reads.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.step_row()
        })
    }

    fn advance_result_set_async(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move { self.step_result_set() })
    }

    fn cancel_handle(&self) -> CancelHandle {
        let cancelled = self.cancelled.clone();
        CancelHandle::new(move || {
            cancelled.store(true, Ordering::SeqCst);
        })
    }

    fn output_parameters(&self) -> Vec<(String, Value)> {
        self.outputs.clone()
    }
}
