use crate::{
    ColumnLayout, Config, Cursor, MaterializeError, ParseContext, Result, ResultShape, RowFactory,
    RowReader, create_row_factory,
    stream::{BoxStream, TryStreamExt},
};
use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

type Resolve = Arc<dyn Fn(&Config) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Maps an abstract result type, a trait object, to the concrete type it is read as.
///
/// ```ignore
/// trait Shape: Send { fn area(&self) -> f64; }
/// let config = Config::builder()
///     .implement::<dyn Shape, Circle>(|v| Box::new(v))
///     .build();
/// // Now `Box<dyn Shape>` is a valid result type, read as `Circle`.
/// ```
#[derive(Default, Clone)]
pub struct Implementations {
    entries: HashMap<TypeId, (&'static str, Resolve)>,
}

impl Implementations {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers `C` as the implementation of `I`. A later registration for the same
    /// `I` replaces the earlier one.
    pub fn register<I, C>(&mut self, convert: fn(C) -> Box<I>)
    where
        I: ?Sized + Send + 'static,
        C: ResultShape,
    {
        let resolve: Resolve =
            Arc::new(move |config: &Config| -> Result<Box<dyn Any + Send + Sync>> {
                let factory: Arc<dyn RowFactory<Box<I>>> = Arc::new(MappedFactory {
                    inner: create_row_factory::<C>(config)?,
                    convert,
                });
                Ok(Box::new(factory))
            });
        log::debug!(
            "Registered `{}` as the implementation of `{}`",
            any::type_name::<C>(),
            any::type_name::<I>()
        );
        self.entries
            .insert(TypeId::of::<I>(), (any::type_name::<C>(), resolve));
    }

    pub fn contains<I: ?Sized + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<I>())
    }

    /// Name of the type registered for `I`.
    pub fn implementation_of<I: ?Sized + 'static>(&self) -> Option<&'static str> {
        self.entries.get(&TypeId::of::<I>()).map(|(name, _)| *name)
    }

    fn factory<I: ?Sized + Send + 'static>(
        &self,
        config: &Config,
    ) -> Result<Arc<dyn RowFactory<Box<I>>>> {
        let Some((_, resolve)) = self.entries.get(&TypeId::of::<I>()) else {
            return Err(MaterializeError::UnsupportedShape {
                type_name: any::type_name::<I>().to_string(),
                reason: "it is abstract and no implementation is registered".into(),
            }
            .into());
        };
        resolve(config)?
            .downcast::<Arc<dyn RowFactory<Box<I>>>>()
            .map(|v| *v)
            .map_err(|_| {
                MaterializeError::UnsupportedShape {
                    type_name: any::type_name::<I>().to_string(),
                    reason: "the registered implementation produces a different type".into(),
                }
                .into()
            })
    }
}

impl fmt::Debug for Implementations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.values().map(|(name, _)| name))
            .finish()
    }
}

/// Reads `C` and converts each value into the abstract `Box<I>`.
pub struct MappedFactory<C: Send + 'static, I: ?Sized> {
    inner: Arc<dyn RowFactory<C>>,
    convert: fn(C) -> Box<I>,
}

struct MappedReader<'a, C, I: ?Sized> {
    inner: Box<dyn RowReader<C> + 'a>,
    convert: fn(C) -> Box<I>,
}

impl<C, I> RowFactory<Box<I>> for MappedFactory<C, I>
where
    C: Send + 'static,
    I: ?Sized + Send + 'static,
{
    fn reader<'a>(
        &'a self,
        columns: &ColumnLayout,
        ctx: &ParseContext,
    ) -> Result<Box<dyn RowReader<Box<I>> + 'a>> {
        Ok(Box::new(MappedReader {
            inner: self.inner.reader(columns, ctx)?,
            convert: self.convert,
        }))
    }

    fn parse_rows(&self, cursor: &mut dyn Cursor, ctx: &ParseContext) -> Result<Vec<Box<I>>> {
        Ok(self
            .inner
            .parse_rows(cursor, ctx)?
            .into_iter()
            .map(self.convert)
            .collect())
    }

    fn parse_rows_async<'a>(
        &'a self,
        cursor: &'a mut dyn Cursor,
        ctx: &'a ParseContext,
    ) -> BoxStream<'a, Result<Box<I>>> {
        Box::pin(self.inner.parse_rows_async(cursor, ctx).map_ok(self.convert))
    }
}

impl<'a, C, I> RowReader<Box<I>> for MappedReader<'a, C, I>
where
    C: Send + 'static,
    I: ?Sized + Send + 'static,
{
    fn read(&mut self, cursor: &dyn Cursor, ctx: &ParseContext) -> Result<Box<I>> {
        self.inner.read(cursor, ctx).map(self.convert)
    }

    fn finish(&mut self) {
        self.inner.finish()
    }
}

impl<I: ?Sized + Send + 'static> ResultShape for Box<I> {
    fn row_factory(config: &Config) -> Result<Arc<dyn RowFactory<Self>>> {
        config.implementations().factory::<I>(config)
    }
}
