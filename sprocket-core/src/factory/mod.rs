mod complex;
mod dynamic;
mod hierarchical;
mod interface;
mod simple;

pub use complex::*;
pub use dynamic::*;
pub use hierarchical::*;
pub use interface::*;
pub use simple::*;

use crate::{
    Attributes, CancellationToken, CoerceOptions, ColumnLayout, Config, Cursor, DataTransformer,
    Error, MaterializeError, Result, TargetType, TransformerPipeline, Transformers, Value, coerce,
    stream::{BoxStream, Stream},
};
use async_stream::try_stream;
use std::sync::Arc;

/// A type the engine knows how to build from the rows of a result set.
///
/// Scalars, `Option` of scalars, enums, records (`#[derive(Record)]`),
/// [`RowLabeled`](crate::RowLabeled) and `Box<dyn Trait>` with a registered implementation
/// all implement it.
pub trait ResultShape: Sized + Send + 'static {
    /// Builds the factory for `Self`. Called once per configuration, the result is
    /// cached: use [`create_row_factory`] instead of calling this directly.
    fn row_factory(config: &Config) -> Result<Arc<dyn RowFactory<Self>>>;
}

/// The factory producing `T`, shared by every call using `config`.
pub fn create_row_factory<T: ResultShape>(config: &Config) -> Result<Arc<dyn RowFactory<T>>> {
    config.cached_factory::<T>()
}

/// Turns the rows of a result set into values of `T`.
///
/// Factories are immutable once built and can be shared across threads. State bound
/// to a given column layout lives in the [`RowReader`] returned by `reader`.
pub trait RowFactory<T: Send + 'static>: Send + Sync {
    /// Prepares the conversion of rows having `columns`. Fails when the layout can't
    /// produce `T`, before any row is read.
    fn reader<'a>(
        &'a self,
        columns: &ColumnLayout,
        ctx: &ParseContext,
    ) -> Result<Box<dyn RowReader<T> + 'a>>;

    /// Reads every remaining row of the current result set. Does not move to the next
    /// result set, except for the child sets a hierarchy consumes.
    fn parse_rows(&self, cursor: &mut dyn Cursor, ctx: &ParseContext) -> Result<Vec<T>> {
        read_rows(self, cursor, ctx)
    }

    /// Asynchronous `parse_rows`, yielding the values while they are read.
    fn parse_rows_async<'a>(
        &'a self,
        cursor: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxStream<'a, Result<T>> {
        stream_rows(self, cursor, ctx)
    }
}

/// Converts the current row of a cursor.
pub trait RowReader<T>: Send {
    fn read(&mut self, cursor: &dyn Cursor, ctx: &ParseContext) -> Result<T>;
    /// Called after the last row was read successfully.
    fn finish(&mut self) {}
}

/// The row loop shared by the synchronous factories.
pub fn read_rows<T, F>(factory: &F, cursor: &mut dyn Cursor, ctx: &ParseContext) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: RowFactory<T> + ?Sized,
{
    ctx.check()?;
    let columns = cursor.columns()?;
    let mut reader = factory.reader(&columns, ctx)?;
    let mut result = Vec::new();
    loop {
        ctx.check()?;
        if !cursor.advance_row()? {
            break;
        }
        result.push(reader.read(&*cursor, ctx)?);
    }
    reader.finish();
    log::trace!("Read {} rows", result.len());
    Ok(result)
}

/// The row loop shared by the asynchronous factories.
pub fn stream_rows<'a, T, F>(
    factory: &'a F,
    cursor: &'a mut dyn Cursor,
    ctx: &'a ParseContext,
) -> BoxStream<'a, Result<T>>
where
    T: Send + 'static,
    F: RowFactory<T> + ?Sized,
{
    boxed(try_stream! {
        ctx.check()?;
        let columns = cursor.columns()?;
        let mut reader = factory.reader(&columns, ctx)?;
        loop {
            ctx.check()?;
            if !ctx.token().guard(cursor.advance_row_async()).await? {
                break;
            }
            let value = reader.read(&*cursor, ctx)?;
            yield value;
        }
        reader.finish();
    })
}

pub(crate) fn boxed<'a, T, S>(stream: S) -> BoxStream<'a, Result<T>>
where
    S: Stream<Item = Result<T>> + Send + 'a,
{
    Box::pin(stream)
}

/// Everything a factory needs from the call in progress.
#[derive(Clone)]
pub struct ParseContext {
    config: Arc<Config>,
    transformers: Transformers,
    token: CancellationToken,
}

impl ParseContext {
    /// Uses the general transformers registered in `config`.
    pub fn new(config: Arc<Config>, token: CancellationToken) -> Self {
        Self {
            transformers: config.transformers().clone(),
            config,
            token,
        }
    }

    /// Appends the transformers of a single call after the configured ones.
    pub fn with_transformers(
        mut self,
        transformers: impl IntoIterator<Item = Arc<dyn DataTransformer>>,
    ) -> Self {
        let mut transformers = transformers.into_iter().peekable();
        if transformers.peek().is_some() {
            self.transformers = self
                .transformers
                .iter()
                .cloned()
                .chain(transformers)
                .collect();
        }
        self
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn transformers(&self) -> &Transformers {
        &self.transformers
    }

    pub fn check(&self) -> Result<()> {
        self.token.check()
    }

    pub fn pipeline(&self) -> TransformerPipeline<'_> {
        TransformerPipeline::new(&self.transformers)
    }

    pub fn coerce_options(&self) -> CoerceOptions {
        CoerceOptions {
            convert_numeric: self.config.convert_numeric(),
            ignore_case: self.config.ignore_enum_case(),
        }
    }

    /// Prepares a cell for the property `property`: nulls reaching a nullable
    /// property become its empty value, everything else goes through the
    /// transformers and is coerced to `target`.
    pub fn convert_cell(
        &self,
        value: Value,
        property: &str,
        target: &TargetType,
        is_nullable: bool,
        attributes: &Attributes,
    ) -> Result<Value> {
        if value.is_null() && is_nullable {
            return Ok(target.empty_value());
        }
        let value = self
            .pipeline()
            .run(value, target, is_nullable, attributes)
            .map_err(|e| {
                e.context(format!(
                    "While transforming the value of {property} ({})",
                    target.type_name()
                ))
            })?;
        coerce(value, target, &self.coerce_options()).map_err(|failure| {
            let error = MaterializeError::Coercion {
                property: property.to_string(),
                expected: target.type_name().to_string(),
                actual: failure.value.received_type_name().to_string(),
                value: failure.value.describe(),
            };
            log::debug!("{error}: {failure}");
            Error::new(failure).context(error)
        })
    }
}

/// Failure of the final assignment of an already coerced cell.
pub(crate) fn assign_error(
    property: &str,
    target: &TargetType,
    received: &'static str,
    source: Error,
) -> Error {
    let error = MaterializeError::Coercion {
        property: property.to_string(),
        expected: target.type_name().to_string(),
        actual: received.to_string(),
        value: received.to_string(),
    };
    log::debug!("{error}: {source:#}");
    source.context(error)
}
