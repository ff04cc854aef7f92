use crate::{
    AsValue, Attributes, ColumnLayout, Config, Cursor, Error, ParseContext, Result, ResultShape,
    RowFactory, RowReader, TargetType, assign_error,
};
use rust_decimal::Decimal;
use std::{any, marker::PhantomData, sync::Arc};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Primitive types, strings, decimals, temporal values, uuids and blobs.
    Simple,
    /// Enums and flag sets, read from their integral value or from names.
    Enum,
}

/// Reads the first column of each row into a value of `T`. Other columns are ignored.
pub struct ScalarFactory<T> {
    kind: ScalarKind,
    target: TargetType,
    _type: PhantomData<fn() -> T>,
}

impl<T: AsValue> ScalarFactory<T> {
    pub fn new() -> Self {
        let target = T::target();
        Self {
            kind: if target.is_enum() {
                ScalarKind::Enum
            } else {
                ScalarKind::Simple
            },
            target,
            _type: PhantomData,
        }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn target(&self) -> &TargetType {
        &self.target
    }
}

impl<T: AsValue> Default for ScalarFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct ScalarReader<'a, T> {
    factory: &'a ScalarFactory<T>,
    column: String,
}

impl<T: AsValue> RowFactory<T> for ScalarFactory<T> {
    fn reader<'a>(
        &'a self,
        columns: &ColumnLayout,
        _ctx: &ParseContext,
    ) -> Result<Box<dyn RowReader<T> + 'a>> {
        let Some(column) = columns.first() else {
            return Err(Error::msg(format!(
                "The result set has no column to read `{}` from",
                any::type_name::<T>()
            )));
        };
        if columns.len() > 1 {
            log::trace!(
                "Reading `{}` from column `{}`, the other {} columns are ignored",
                any::type_name::<T>(),
                column.name,
                columns.len() - 1
            );
        }
        Ok(Box::new(ScalarReader {
            factory: self,
            column: column.name.clone(),
        }))
    }
}

impl<'a, T: AsValue> RowReader<T> for ScalarReader<'a, T> {
    fn read(&mut self, cursor: &dyn Cursor, ctx: &ParseContext) -> Result<T> {
        let target = &self.factory.target;
        let value = ctx.convert_cell(
            cursor.value(0)?,
            &self.column,
            target,
            T::NULLABLE,
            &Attributes::default(),
        )?;
        let received = value.received_type_name();
        T::try_from_value(value).map_err(|e| assign_error(&self.column, target, received, e))
    }
}

macro_rules! impl_result_shape {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ResultShape for $ty {
                fn row_factory(_config: &Config) -> Result<Arc<dyn RowFactory<Self>>> {
                    Ok(Arc::new(ScalarFactory::<Self>::new()))
                }
            }
        )+
    };
}
impl_result_shape!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    Decimal,
    String,
    Vec<u8>,
    Date,
    Time,
    PrimitiveDateTime,
    OffsetDateTime,
    Uuid,
);

impl<T: AsValue> ResultShape for Option<T> {
    fn row_factory(_config: &Config) -> Result<Arc<dyn RowFactory<Self>>> {
        Ok(Arc::new(ScalarFactory::<Self>::new()))
    }
}
