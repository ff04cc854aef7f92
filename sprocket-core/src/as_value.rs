use crate::{Error, Result, TargetType, Value};
use rust_decimal::Decimal;
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between a native Rust type and the dynamically typed [`Value`].
///
/// Every type that can receive a database cell implements it: the scalar types,
/// `Option<T>` of those, and the enums produced by `#[derive(ResultEnum)]` or
/// [`result_flags!`](crate::result_flags).
///
/// `try_from_value` is strict: it only accepts the variant returned by
/// `as_empty_value`. Widening, narrowing and enum parsing belong to
/// [`coerce`](crate::coerce), which runs before it and honors the configured policy.
///
/// # Nulls
/// A null reaching a non `Option` type produces the natural default of the type
/// (`0`, `false`, empty string, nil uuid). Temporal types have no natural default
/// and reject it.
///
/// ```rust
/// use sprocket_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// assert_eq!(Option::<i32>::try_from_value(Value::Int32(None)).unwrap(), None);
/// ```
pub trait AsValue: Sized + Send + 'static {
    /// `true` when a database null maps to an absent value instead of a default.
    const NULLABLE: bool = false;
    /// Empty value of the database type backing `Self`.
    fn as_empty_value() -> Value;
    /// What coercion must produce before `try_from_value` is called. Transformers
    /// receive it too, never wrapped into a nullable form.
    fn target() -> TargetType {
        TargetType::Scalar(Self::as_empty_value())
    }
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, null => $default:expr)? $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    $(v if v.is_null() => Ok($default),)?
                    _ => Err(Error::msg(format!(
                        "Cannot convert {} to {}",
                        value.describe(),
                        any::type_name::<Self>(),
                    ))),
                }
            }
        }
    };
}
impl_as_value!(bool, Value::Boolean, null => false);
impl_as_value!(i8, Value::Int8, null => 0);
impl_as_value!(i16, Value::Int16, null => 0);
impl_as_value!(i32, Value::Int32, null => 0);
impl_as_value!(i64, Value::Int64, null => 0);
impl_as_value!(u8, Value::UInt8, null => 0);
impl_as_value!(u16, Value::UInt16, null => 0);
impl_as_value!(u32, Value::UInt32, null => 0);
impl_as_value!(u64, Value::UInt64, null => 0);
impl_as_value!(f32, Value::Float32, null => 0.0);
impl_as_value!(f64, Value::Float64, null => 0.0);
impl_as_value!(Decimal, Value::Decimal, null => Decimal::ZERO);
impl_as_value!(String, Value::Varchar, null => String::new());
impl_as_value!(Uuid, Value::Uuid, null => Uuid::nil());
impl_as_value!(Date, Value::Date);
impl_as_value!(Time, Value::Time);
impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl_as_value!(OffsetDateTime, Value::TimestampWithTimezone);

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v.into_vec()),
            v if v.is_null() => Ok(Vec::new()),
            _ => Err(Error::msg(format!(
                "Cannot convert {} to {}",
                value.describe(),
                any::type_name::<Self>(),
            ))),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    const NULLABLE: bool = true;
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn target() -> TargetType {
        T::target()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}
