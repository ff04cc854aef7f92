use crate::{EnumType, Error, Result, TargetType, Value};

/// An enum materialized from its integral representation or from its names.
///
/// Implemented by `#[derive(ResultEnum)]` for fieldless enums and by
/// [`result_flags!`](crate::result_flags) for flag sets.
pub trait ResultEnum: Sized + Copy + Send + 'static {
    const NAME: &'static str;
    /// The bits of several values may be combined.
    const FLAGS: bool = false;
    /// Empty value of the integral representation.
    fn underlying() -> Value;
    /// Every declared name with its value.
    fn variants() -> &'static [(&'static str, i64)];
    fn from_bits(bits: i64) -> Option<Self>;
    fn bits(self) -> i64;
    /// Value given to a database null.
    fn empty() -> Self;
}

pub fn enum_target<E: ResultEnum>() -> TargetType {
    TargetType::Enum(EnumType {
        name: E::NAME,
        underlying: E::underlying(),
        flags: E::FLAGS,
        variants: E::variants(),
    })
}

/// Strict conversion of an already coerced value into `E`.
pub fn enum_try_from_value<E: ResultEnum>(value: Value) -> Result<E> {
    if value.is_null() {
        return Ok(E::empty());
    }
    let bits = if value.same_type(&E::underlying()) {
        value
            .as_i128()
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| {
                Error::msg(format!("Cannot convert {} to {}", value.describe(), E::NAME))
            })?
    } else {
        return Err(Error::msg(format!(
            "Cannot convert {} to {}, expected {}",
            value.describe(),
            E::NAME,
            E::underlying().type_name()
        )));
    };
    E::from_bits(bits)
        .ok_or_else(|| Error::msg(format!("{bits} is not a defined value of {}", E::NAME)))
}

/// Value of `E` in its integral representation.
pub fn enum_as_value<E: ResultEnum>(value: E) -> Value {
    let bits = value.bits();
    match E::underlying() {
        Value::Int8(..) => Value::Int8(Some(bits as _)),
        Value::Int16(..) => Value::Int16(Some(bits as _)),
        Value::Int64(..) => Value::Int64(Some(bits)),
        Value::UInt8(..) => Value::UInt8(Some(bits as _)),
        Value::UInt16(..) => Value::UInt16(Some(bits as _)),
        Value::UInt32(..) => Value::UInt32(Some(bits as _)),
        Value::UInt64(..) => Value::UInt64(Some(bits as _)),
        _ => Value::Int32(Some(bits as _)),
    }
}

/// Implements `AsValue` and `ResultShape` for a type implementing `ResultEnum`.
#[doc(hidden)]
#[macro_export]
macro_rules! impl_enum_value {
    ($name:ty) => {
        impl $crate::AsValue for $name {
            fn as_empty_value() -> $crate::Value {
                <$name as $crate::ResultEnum>::underlying()
            }
            fn target() -> $crate::TargetType {
                $crate::enum_target::<$name>()
            }
            fn as_value(self) -> $crate::Value {
                $crate::enum_as_value(self)
            }
            fn try_from_value(value: $crate::Value) -> $crate::Result<Self> {
                $crate::enum_try_from_value::<$name>(value)
            }
        }
        impl $crate::ResultShape for $name {
            fn row_factory(
                _config: &$crate::Config,
            ) -> $crate::Result<::std::sync::Arc<dyn $crate::RowFactory<Self>>> {
                Ok(::std::sync::Arc::new($crate::ScalarFactory::<Self>::new()))
            }
        }
    };
}

/// Declares a set of flags that can be read from a number or from a list of names
/// separated by commas (`"Red, Blue"`).
///
/// ```rust
/// sprocket_core::result_flags! {
///     pub struct Colors: i32 {
///         Red = 1,
///         Green = 2,
///         Blue = 4,
///     }
/// }
/// assert_eq!((Colors::Red | Colors::Blue).bits(), 5);
/// ```
#[macro_export]
macro_rules! result_flags {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident: $repr:ty {
            $($flag:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name(pub $repr);

        #[allow(non_upper_case_globals)]
        impl $name {
            $(pub const $flag: $name = $name($value);)*
            pub const fn bits(self) -> $repr {
                self.0
            }
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl ::std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                $name(self.0 | rhs.0)
            }
        }

        impl $crate::ResultEnum for $name {
            const NAME: &'static str = stringify!($name);
            const FLAGS: bool = true;
            fn underlying() -> $crate::Value {
                <$repr as $crate::AsValue>::as_empty_value()
            }
            fn variants() -> &'static [(&'static str, i64)] {
                const VARIANTS: &[(&str, i64)] = &[$((stringify!($flag), $value as i64)),*];
                VARIANTS
            }
            fn from_bits(bits: i64) -> Option<Self> {
                <$repr>::try_from(bits).ok().map($name)
            }
            fn bits(self) -> i64 {
                self.0 as i64
            }
            fn empty() -> Self {
                $name(0)
            }
        }

        $crate::impl_enum_value!($name);
    };
}
