use crate::{
    ColumnLayout, Cursor, MaterializeError, ParseContext, Record, Result, RowFactory, RowNames,
    RowReader, assign_error,
};
use std::{
    collections::HashMap,
    marker::PhantomData,
    sync::{Arc, PoisonError, RwLock},
};

/// Which column feeds which property, for one column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    /// Property index and column ordinal, in property order.
    pub properties: Vec<(usize, usize)>,
}

impl Bindings {
    /// Binds every property of `T` to a column of `columns`.
    ///
    /// Fails listing all the properties without a column unless they are optional.
    pub fn resolve<T: Record>(columns: &ColumnLayout) -> Result<Bindings> {
        let mut properties = Vec::new();
        let mut missing = Vec::new();
        for (index, field) in T::fields().iter().enumerate() {
            match columns.find(field.column) {
                Some(ordinal) => properties.push((index, ordinal)),
                None if field.optional => {
                    log::trace!("Optional property {} of `{}` is not bound", field.name, T::NAME)
                }
                None => missing.push(field.name.to_string()),
            }
        }
        if !missing.is_empty() {
            let error = MaterializeError::MissingColumns {
                type_name: T::NAME,
                properties: missing,
            };
            log::error!("{error}");
            return Err(error.into());
        }
        Ok(Bindings { properties })
    }
}

/// Builds records by assigning each column to the property with the same name.
///
/// The bindings are computed once per distinct column layout and reused.
pub struct ComplexFactory<T> {
    bindings: RwLock<HashMap<RowNames, Arc<Bindings>>>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Record> ComplexFactory<T> {
    pub fn new() -> Self {
        Self {
            bindings: Default::default(),
            _type: PhantomData,
        }
    }

    /// The bindings of `columns`, resolved on first use.
    pub fn bindings(&self, columns: &ColumnLayout) -> Result<Arc<Bindings>> {
        if let Some(bindings) = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(columns.names())
        {
            return Ok(bindings.clone());
        }
        let bindings = Arc::new(Bindings::resolve::<T>(columns)?);
        log::debug!(
            "Bound {} of {} properties of `{}`",
            bindings.properties.len(),
            T::fields().len(),
            T::NAME
        );
        Ok(self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(columns.names().clone())
            .or_insert(bindings)
            .clone())
    }
}

impl<T: Record> Default for ComplexFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct ComplexReader<T> {
    bindings: Arc<Bindings>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Record> RowFactory<T> for ComplexFactory<T> {
    fn reader<'a>(
        &'a self,
        columns: &ColumnLayout,
        _ctx: &ParseContext,
    ) -> Result<Box<dyn RowReader<T> + 'a>> {
        Ok(Box::new(ComplexReader::<T> {
            bindings: self.bindings(columns)?,
            _type: PhantomData,
        }))
    }
}

impl<T: Record> RowReader<T> for ComplexReader<T> {
    fn read(&mut self, cursor: &dyn Cursor, ctx: &ParseContext) -> Result<T> {
        let fields = T::fields();
        let mut result = T::default();
        for &(index, ordinal) in &self.bindings.properties {
            let field = &fields[index];
            let value = ctx.convert_cell(
                cursor.value(ordinal)?,
                field.name,
                &field.target,
                field.nullable,
                &field.attributes(),
            )?;
            let received = value.received_type_name();
            result
                .set_field(index, value)
                .map_err(|e| assign_error(field.name, &field.target, received, e))?;
        }
        Ok(result)
    }
}
