use crate::{Attributes, DataTransformer, Error, Result, TargetType, Value};
use time::{PrimitiveDateTime, UtcOffset};

/// Removes leading and trailing whitespace from strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrimString;

impl DataTransformer for TrimString {
    fn can_transform(&self, value: &Value, _: &TargetType, _: bool, _: &Attributes) -> bool {
        matches!(value, Value::Varchar(Some(..)))
    }

    fn transform(&self, value: Value, _: &TargetType, _: bool, _: &Attributes) -> Result<Value> {
        Ok(match value {
            Value::Varchar(Some(v)) => Value::Varchar(Some(v.trim().to_owned())),
            v => v,
        })
    }
}

/// Turns empty (or blank) strings into null for properties that accept null.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyStringAsNull;

impl DataTransformer for EmptyStringAsNull {
    fn can_transform(
        &self,
        value: &Value,
        _: &TargetType,
        is_nullable: bool,
        _: &Attributes,
    ) -> bool {
        is_nullable && matches!(value, Value::Varchar(Some(v)) if v.trim().is_empty())
    }

    fn transform(&self, _: Value, target: &TargetType, _: bool, _: &Attributes) -> Result<Value> {
        Ok(target.empty_value())
    }
}

/// Reads timestamps as UTC: a timestamp without offset gains the UTC offset, one with
/// an offset is converted to UTC. Going to a timestamp without offset drops it after
/// converting to UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct UtcTimestamp;

impl DataTransformer for UtcTimestamp {
    fn can_transform(&self, value: &Value, target: &TargetType, _: bool, _: &Attributes) -> bool {
        matches!(
            (value, target),
            (
                Value::Timestamp(Some(..)) | Value::TimestampWithTimezone(Some(..)),
                TargetType::Scalar(Value::Timestamp(..) | Value::TimestampWithTimezone(..)),
            )
        )
    }

    fn transform(
        &self,
        value: Value,
        target: &TargetType,
        _: bool,
        _: &Attributes,
    ) -> Result<Value> {
        let utc = match value {
            Value::Timestamp(Some(v)) => v.assume_utc(),
            Value::TimestampWithTimezone(Some(v)) => v.to_offset(UtcOffset::UTC),
            v => return Ok(v),
        };
        Ok(match target {
            TargetType::Scalar(Value::Timestamp(..)) => {
                Value::Timestamp(Some(PrimitiveDateTime::new(utc.date(), utc.time())))
            }
            _ => Value::TimestampWithTimezone(Some(utc)),
        })
    }
}

/// Reads booleans stored as text: `Y`/`N`, `yes`/`no`, `true`/`false`, `T`/`F`,
/// `1`/`0`, ignoring case.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolFromText;

impl BoolFromText {
    fn parse(text: &str) -> Option<bool> {
        let text = text.trim();
        ["y", "yes", "true", "t", "1"]
            .iter()
            .any(|v| v.eq_ignore_ascii_case(text))
            .then_some(true)
            .or_else(|| {
                ["n", "no", "false", "f", "0"]
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(text))
                    .then_some(false)
            })
    }
}

impl DataTransformer for BoolFromText {
    fn can_transform(&self, value: &Value, target: &TargetType, _: bool, _: &Attributes) -> bool {
        matches!(target, TargetType::Scalar(Value::Boolean(..)))
            && matches!(value, Value::Varchar(Some(v)) if Self::parse(v).is_some())
    }

    fn transform(&self, value: Value, _: &TargetType, _: bool, _: &Attributes) -> Result<Value> {
        match value {
            Value::Varchar(Some(ref v)) => Self::parse(v)
                .map(|v| Value::Boolean(Some(v)))
                .ok_or_else(|| {
                    Error::msg(format!("Cannot read a boolean from {}", value.describe()))
                }),
            v => Ok(v),
        }
    }
}
