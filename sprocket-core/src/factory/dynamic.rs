use crate::{
    Attributes, ColumnLayout, Config, Cursor, ParseContext, Result, ResultShape, Row, RowFactory,
    RowLabeled, RowReader, TargetType,
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

/// Produces a [`RowLabeled`] per row, keeping every column with its declared type.
///
/// Nulls are kept as typed nulls. Non null cells pass through the general
/// transformers (the target being the declared type of the column) and are never
/// coerced.
///
/// A factory can be told which columns it expects: [`DynamicFactory::unseen`]
/// then reports those that never appeared in a result set that had rows.
#[derive(Debug, Default)]
pub struct DynamicFactory {
    expected: Vec<String>,
    seen: Mutex<HashSet<String>>,
}

impl DynamicFactory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Names of the columns that should be present, compared ignoring ASCII case.
    pub fn expecting<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            expected: names.into_iter().map(Into::into).collect(),
            seen: Default::default(),
        }
    }

    /// Expected names never observed so far, in the order they were given.
    pub fn unseen(&self) -> Vec<String> {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        self.expected
            .iter()
            .filter(|v| !seen.contains(&v.to_ascii_lowercase()))
            .cloned()
            .collect()
    }

    fn observe(&self, columns: &ColumnLayout) {
        if self.expected.is_empty() {
            return;
        }
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.extend(columns.iter().map(|c| c.name.to_ascii_lowercase()));
    }
}

struct DynamicReader<'a> {
    factory: &'a DynamicFactory,
    columns: ColumnLayout,
    rows: usize,
}

impl RowFactory<RowLabeled> for DynamicFactory {
    fn reader<'a>(
        &'a self,
        columns: &ColumnLayout,
        _ctx: &ParseContext,
    ) -> Result<Box<dyn RowReader<RowLabeled> + 'a>> {
        Ok(Box::new(DynamicReader {
            factory: self,
            columns: columns.clone(),
            rows: 0,
        }))
    }
}

impl<'a> RowReader<RowLabeled> for DynamicReader<'a> {
    fn read(&mut self, cursor: &dyn Cursor, ctx: &ParseContext) -> Result<RowLabeled> {
        let pipeline = ctx.pipeline();
        let values = self
            .columns
            .iter()
            .map(|column| {
                let value = cursor.value(column.ordinal)?;
                if value.is_null() {
                    return Ok(value);
                }
                let target = TargetType::Scalar(column.declared.clone());
                pipeline.run(value, &target, true, &Attributes::default())
            })
            .collect::<Result<Row>>()?;
        self.rows += 1;
        Ok(RowLabeled::new(self.columns.names().clone(), values))
    }

    fn finish(&mut self) {
        if self.rows > 0 {
            self.factory.observe(&self.columns);
        }
    }
}

impl ResultShape for RowLabeled {
    fn row_factory(_config: &Config) -> Result<Arc<dyn RowFactory<Self>>> {
        Ok(Arc::new(DynamicFactory::new()))
    }
}
