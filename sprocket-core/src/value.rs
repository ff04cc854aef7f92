use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// A single database cell.
///
/// Every variant wraps an `Option` so that a null keeps the type declared by the
/// column that produced it (`Value::Int32(None)`). An empty value is also how a type
/// is described: the declared type of a column and the target of a coercion are both
/// plain empty values. `Value::Null` is the untyped database null.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    /// Both values describe the same database type, regardless of their content.
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// `true` for `Value::Null` and for every typed null.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    /// The empty value of the same type (the type tag).
    pub fn as_empty(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
        }
    }

    /// Name of the database type, as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "DBNull",
            Value::Boolean(..) => "Boolean",
            Value::Int8(..) => "SByte",
            Value::Int16(..) => "Int16",
            Value::Int32(..) => "Int32",
            Value::Int64(..) => "Int64",
            Value::UInt8(..) => "Byte",
            Value::UInt16(..) => "UInt16",
            Value::UInt32(..) => "UInt32",
            Value::UInt64(..) => "UInt64",
            Value::Float32(..) => "Single",
            Value::Float64(..) => "Double",
            Value::Decimal(..) => "Decimal",
            Value::Varchar(..) => "String",
            Value::Blob(..) => "Byte[]",
            Value::Date(..) => "Date",
            Value::Time(..) => "Time",
            Value::Timestamp(..) => "DateTime",
            Value::TimestampWithTimezone(..) => "DateTimeOffset",
            Value::Uuid(..) => "Guid",
        }
    }

    /// Type name of the value actually received: `DBNull` for any null.
    pub fn received_type_name(&self) -> &'static str {
        if self.is_null() {
            "DBNull"
        } else {
            self.type_name()
        }
    }

    /// Renders the cell for diagnostics: nulls as `DBNull`, strings quoted, anything
    /// else as its text followed by its type.
    pub fn describe(&self) -> String {
        match self {
            v if v.is_null() => "DBNull".into(),
            Value::Varchar(Some(v)) => format!("\"{}\"", crate::truncate_long!(v)),
            v => format!("{v} ({})", v.type_name()),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Int8(..)
                | Value::Int16(..)
                | Value::Int32(..)
                | Value::Int64(..)
                | Value::UInt8(..)
                | Value::UInt16(..)
                | Value::UInt32(..)
                | Value::UInt64(..)
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                Value::Float32(..) | Value::Float64(..) | Value::Decimal(..)
            )
    }

    /// The content of a non null integer cell, widened.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Int8(Some(v)) => Some(v as _),
            Value::Int16(Some(v)) => Some(v as _),
            Value::Int32(Some(v)) => Some(v as _),
            Value::Int64(Some(v)) => Some(v as _),
            Value::UInt8(Some(v)) => Some(v as _),
            Value::UInt16(Some(v)) => Some(v as _),
            Value::UInt32(Some(v)) => Some(v as _),
            Value::UInt64(Some(v)) => Some(v as _),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! write_some {
            ($v:expr) => {
                match $v {
                    Some(v) => write!(f, "{}", v),
                    None => f.write_str("NULL"),
                }
            };
        }
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write_some!(v),
            Value::Int8(v) => write_some!(v),
            Value::Int16(v) => write_some!(v),
            Value::Int32(v) => write_some!(v),
            Value::Int64(v) => write_some!(v),
            Value::UInt8(v) => write_some!(v),
            Value::UInt16(v) => write_some!(v),
            Value::UInt32(v) => write_some!(v),
            Value::UInt64(v) => write_some!(v),
            Value::Float32(v) => write_some!(v),
            Value::Float64(v) => write_some!(v),
            Value::Decimal(v) => write_some!(v),
            Value::Varchar(v) => write_some!(v),
            Value::Blob(Some(v)) => {
                f.write_str("0x")?;
                v.iter().try_for_each(|b| write!(f, "{b:02X}"))
            }
            Value::Blob(None) => f.write_str("NULL"),
            Value::Date(v) => write_some!(v),
            Value::Time(v) => write_some!(v),
            Value::Timestamp(v) => write_some!(v),
            Value::TimestampWithTimezone(v) => write_some!(v),
            Value::Uuid(v) => write_some!(v),
        }
    }
}
