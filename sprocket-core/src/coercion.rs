use crate::Value;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};

/// The static type a cell is materialized into.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetType {
    /// A scalar, described by its empty value.
    Scalar(Value),
    Enum(EnumType),
}

/// Runtime description of an enum backed by an integral representation.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: &'static str,
    /// Empty value of the integral representation.
    pub underlying: Value,
    /// Values may be combined with bitwise OR.
    pub flags: bool,
    pub variants: &'static [(&'static str, i64)],
}

impl TargetType {
    /// The value a database null becomes.
    pub fn empty_value(&self) -> Value {
        match self {
            TargetType::Scalar(v) => v.as_empty(),
            TargetType::Enum(e) => e.underlying.as_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TargetType::Scalar(v) => v.type_name(),
            TargetType::Enum(e) => e.name,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TargetType::Enum(..))
    }
}

impl EnumType {
    pub fn name_of(&self, bits: i64) -> Option<&'static str> {
        self.variants
            .iter()
            .find_map(|(name, v)| (*v == bits).then_some(*name))
    }
}

/// Policy knobs of [`coerce`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoerceOptions {
    /// Allow conversions between different numeric types, and between numbers and
    /// booleans.
    pub convert_numeric: bool,
    /// Match enum names ignoring ASCII case.
    pub ignore_case: bool,
}

/// A cell that could not be coerced. Carries the rejected value back so the caller
/// can report what the database returned.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct CoercionFailure {
    pub value: Value,
    pub reason: String,
}

impl CoercionFailure {
    pub fn new(value: Value, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: reason.into(),
        }
    }
}

/// Converts a cell to `target`.
///
/// - A null of any type becomes the empty value of the target.
/// - A value of the target type is returned unchanged.
/// - Numeric values of a different type, and numbers to or from booleans, are
///   converted only with [`CoerceOptions::convert_numeric`]. Narrowing checks the
///   range, floating point values are rounded half to even.
/// - Enum targets accept their underlying integral type, or a string containing a
///   name. Names separated by commas are combined with bitwise OR.
///
/// The result always has the type of `target.empty_value()`.
pub fn coerce(
    value: Value,
    target: &TargetType,
    options: &CoerceOptions,
) -> Result<Value, CoercionFailure> {
    if value.is_null() {
        return Ok(target.empty_value());
    }
    match target {
        TargetType::Scalar(target) => coerce_scalar(value, target, options),
        TargetType::Enum(target) => coerce_enum(value, target, options),
    }
}

fn coerce_scalar(
    value: Value,
    target: &Value,
    options: &CoerceOptions,
) -> Result<Value, CoercionFailure> {
    if value.same_type(target) {
        return Ok(value);
    }
    if options.convert_numeric {
        let number = match value {
            Value::Boolean(Some(v)) => Some(Number::Integer(v as i128)),
            ref v => Number::of(v),
        };
        if let Some(number) = number {
            if let Value::Boolean(..) = target {
                return Ok(Value::Boolean(Some(number.is_nonzero())));
            }
            if target.is_numeric() {
                return match number.convert(target) {
                    Some(v) => Ok(v),
                    None => {
                        let reason = format!(
                            "Value {} is out of range for {}",
                            value.describe(),
                            target.type_name()
                        );
                        Err(CoercionFailure::new(value, reason))
                    }
                };
            }
        }
    }
    let reason = format!(
        "Cannot convert {} to {}",
        value.type_name(),
        target.type_name()
    );
    Err(CoercionFailure::new(value, reason))
}

fn coerce_enum(
    value: Value,
    target: &EnumType,
    options: &CoerceOptions,
) -> Result<Value, CoercionFailure> {
    let bits = match value {
        Value::Varchar(Some(ref text)) => parse_enum_text(text, target, options.ignore_case),
        ref v if v.same_type(&target.underlying) => v
            .as_i128()
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| format!("{} does not fit into {}", v.describe(), target.name)),
        ref v if options.convert_numeric && v.is_numeric() => Number::of(v)
            .and_then(|n| n.convert(&target.underlying))
            .and_then(|v| v.as_i128())
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| format!("{} is out of range for {}", v.describe(), target.name)),
        ref v => Err(format!(
            "Cannot convert {} to {} (backed by {})",
            v.type_name(),
            target.name,
            target.underlying.type_name()
        )),
    };
    let bits = match bits {
        Ok(v) => v,
        Err(reason) => return Err(CoercionFailure::new(value, reason)),
    };
    if !target.flags && target.name_of(bits).is_none() {
        let reason = format!("{bits} is not a defined value of {}", target.name);
        return Err(CoercionFailure::new(value, reason));
    }
    match Number::Integer(bits as i128).convert(&target.underlying) {
        Some(v) => Ok(v),
        None => {
            let reason = format!(
                "{bits} does not fit into {}",
                target.underlying.type_name()
            );
            Err(CoercionFailure::new(value, reason))
        }
    }
}

/// Parses one name, or several names separated by commas, into the enum bits.
fn parse_enum_text(text: &str, target: &EnumType, ignore_case: bool) -> Result<i64, String> {
    let mut result = 0;
    let mut parts = 0;
    for part in text.split(',').map(str::trim) {
        if part.is_empty() {
            return Err(format!("`{text}` is not a valid name of {}", target.name));
        }
        let found = target.variants.iter().find(|(name, _)| {
            if ignore_case {
                name.eq_ignore_ascii_case(part)
            } else {
                *name == part
            }
        });
        match found {
            Some((_, v)) => result |= v,
            None => return Err(format!("`{part}` is not a valid name of {}", target.name)),
        }
        parts += 1;
    }
    if parts > 1 && !target.flags {
        return Err(format!(
            "`{text}` combines several names but {} is not a flags enum",
            target.name
        ));
    }
    Ok(result)
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i128),
    Float(f64),
    Decimal(Decimal),
}

impl Number {
    fn of(value: &Value) -> Option<Number> {
        if let Some(v) = value.as_i128() {
            return Some(Number::Integer(v));
        }
        match *value {
            Value::Float32(Some(v)) => Some(Number::Float(v as f64)),
            Value::Float64(Some(v)) => Some(Number::Float(v)),
            Value::Decimal(Some(v)) => Some(Number::Decimal(v)),
            _ => None,
        }
    }

    fn is_nonzero(self) -> bool {
        match self {
            Number::Integer(v) => v != 0,
            Number::Float(v) => v != 0.0,
            Number::Decimal(v) => !v.is_zero(),
        }
    }

    fn to_i128(self) -> Option<i128> {
        match self {
            Number::Integer(v) => Some(v),
            Number::Float(v) => {
                let v = v.round_ties_even();
                if !v.is_finite() || v < i128::MIN as f64 || v >= i128::MAX as f64 {
                    return None;
                }
                Some(v as i128)
            }
            Number::Decimal(v) => v
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .to_i128(),
        }
    }

    fn to_f64(self) -> Option<f64> {
        match self {
            Number::Integer(v) => Some(v as f64),
            Number::Float(v) => Some(v),
            Number::Decimal(v) => v.to_f64(),
        }
    }

    fn convert(self, target: &Value) -> Option<Value> {
        macro_rules! integer {
            ($variant:path, $ty:ty) => {
                self.to_i128()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .map(|v| $variant(Some(v)))
            };
        }
        match target {
            Value::Int8(..) => integer!(Value::Int8, i8),
            Value::Int16(..) => integer!(Value::Int16, i16),
            Value::Int32(..) => integer!(Value::Int32, i32),
            Value::Int64(..) => integer!(Value::Int64, i64),
            Value::UInt8(..) => integer!(Value::UInt8, u8),
            Value::UInt16(..) => integer!(Value::UInt16, u16),
            Value::UInt32(..) => integer!(Value::UInt32, u32),
            Value::UInt64(..) => integer!(Value::UInt64, u64),
            Value::Float32(..) => self.to_f64().and_then(|v| {
                if v.is_finite() && v.abs() > f32::MAX as f64 {
                    None
                } else {
                    Some(Value::Float32(Some(v as f32)))
                }
            }),
            Value::Float64(..) => self.to_f64().map(|v| Value::Float64(Some(v))),
            Value::Decimal(..) => match self {
                Number::Integer(v) => Decimal::from_i128(v),
                Number::Float(v) => Decimal::from_f64(v),
                Number::Decimal(v) => Some(v),
            }
            .map(|v| Value::Decimal(Some(v))),
            _ => None,
        }
    }
}
