use crate::{Error, separated};
use std::time::Duration;

/// Failures raised by the materialization engine.
///
/// They travel inside [`Error`](crate::Error) like every other error of the crate.
/// Use [`is_cancelled`] and [`is_timeout`] to classify an outcome, or
/// `error.downcast_ref::<MaterializeError>()` for the details.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("{}", missing_columns(.type_name, .properties))]
    MissingColumns {
        type_name: &'static str,
        properties: Vec<String>,
    },

    #[error("Error setting [{expected}] {property}. Stored Procedure returns [{actual}].")]
    Coercion {
        property: String,
        expected: String,
        actual: String,
        /// The received cell, as rendered by [`Value::describe`](crate::Value::describe).
        value: String,
    },

    #[error("Type `{type_name}` cannot be used as a result: {reason}")]
    UnsupportedShape { type_name: String, reason: String },

    #[error("The operation was cancelled")]
    Cancelled,

    #[error("The stored procedure did not complete within {after:?}")]
    Timeout { after: Duration },

    #[error("The stored procedure returned no result set for `{type_name}`")]
    MissingResultSet { type_name: &'static str },
}

fn missing_columns(type_name: &str, properties: &[String]) -> String {
    let mut names = String::new();
    separated(
        &mut names,
        properties,
        |out, v| {
            out.push('`');
            out.push_str(v);
            out.push('`');
        },
        ", ",
    );
    if properties.len() == 1 {
        format!("The property {names} of `{type_name}` has no matching column in the result set")
    } else {
        format!(
            "The properties {names} of `{type_name}` have no matching columns in the result set"
        )
    }
}

fn find(error: &Error) -> Option<&MaterializeError> {
    error
        .downcast_ref::<MaterializeError>()
        .or_else(|| error.chain().find_map(|e| e.downcast_ref::<MaterializeError>()))
}

/// The error is (or wraps) a cancellation requested through the token.
pub fn is_cancelled(error: &Error) -> bool {
    matches!(find(error), Some(MaterializeError::Cancelled))
}

/// The error is (or wraps) a command that exceeded its timeout.
pub fn is_timeout(error: &Error) -> bool {
    matches!(find(error), Some(MaterializeError::Timeout { .. }))
}
