//! Conversion of `validator` failures into field-level errors.
//!
//! One validation pass yields one [`AppError`] carrying every failing field, sorted by field
//! name and then by rule so responses are stable.

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::Value;
use validator::{ValidationError, ValidationErrors};

use crate::errors::{AppError, FieldError};

/// Message used on the top-level error when individual fields failed.
pub const VALIDATION_FAILED: &str = "Validation failed";

/// Collects every field error of `errors` into a single `VALIDATION_ERROR`.
#[track_caller]
pub fn from_validation_errors(errors: &ValidationErrors) -> AppError {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, failures)| {
            let field = field.to_string();
            failures
                .iter()
                .map(move |failure| to_field_error(&field, failure))
        })
        .collect();

    field_errors.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));

    AppError::validation(VALIDATION_FAILED, field_errors)
}

/// Field error for a request body that omitted `field` entirely.
pub fn missing_field(field: &str) -> FieldError {
    FieldError::new(field, format!("{field} is required"), "required")
}

fn to_field_error(field: &str, failure: &ValidationError) -> FieldError {
    let message = match &failure.message {
        Some(custom) => custom.to_string(),
        None => rule_message(field, &failure.code, &failure.params),
    };

    let error = FieldError::new(field, message, failure.code.to_string());
    match failure.params.get("value") {
        Some(value) if !value.is_null() => error.with_value(value.clone()),
        _ => error,
    }
}

fn param(params: &HashMap<Cow<'static, str>, Value>, key: &str) -> Option<String> {
    params.get(key).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Human-readable message for a failed rule.
pub fn rule_message(field: &str, rule: &str, params: &HashMap<Cow<'static, str>, Value>) -> String {
    let min = param(params, "min");
    let max = param(params, "max");
    let equal = param(params, "equal");

    match rule {
        "required" => format!("{field} is required"),
        "email" => format!("{field} must be a valid email address"),
        "url" => format!("{field} must be a valid URL"),
        "uuid" => format!("{field} must be a valid UUID"),
        "numeric" => format!("{field} must be a number"),
        "alpha" => format!("{field} must contain only letters"),
        "alphanum" => format!("{field} must contain only letters and numbers"),
        "regex" => format!("{field} has an invalid format"),
        "must_match" => match param(params, "other") {
            Some(other) => format!("{field} must match {other}"),
            None => format!("{field} does not match"),
        },
        "oneof" => match param(params, "values") {
            Some(values) => format!("{field} must be one of: {values}"),
            None => format!("{field} is not an allowed value"),
        },
        "len" => match equal.or(min) {
            Some(n) => format!("{field} must be exactly {n} characters long"),
            None => format!("{field} has an invalid length"),
        },
        "min" => match min {
            Some(n) => format!("{field} must be at least {n} characters long"),
            None => format!("{field} is too short"),
        },
        "max" => match max {
            Some(n) => format!("{field} must be at most {n} characters long"),
            None => format!("{field} is too long"),
        },
        "length" => match (equal, min, max) {
            (Some(n), _, _) => format!("{field} must be exactly {n} characters long"),
            (None, Some(lo), Some(hi)) => {
                format!("{field} must be between {lo} and {hi} characters long")
            }
            (None, Some(lo), None) => format!("{field} must be at least {lo} characters long"),
            (None, None, Some(hi)) => format!("{field} must be at most {hi} characters long"),
            (None, None, None) => format!("{field} has an invalid length"),
        },
        "gte" => match min {
            Some(n) => format!("{field} must be greater than or equal to {n}"),
            None => format!("{field} is too small"),
        },
        "lte" => match max {
            Some(n) => format!("{field} must be less than or equal to {n}"),
            None => format!("{field} is too large"),
        },
        "range" => match (min, max) {
            (Some(lo), Some(hi)) => format!("{field} must be between {lo} and {hi}"),
            (Some(lo), None) => format!("{field} must be greater than or equal to {lo}"),
            (None, Some(hi)) => format!("{field} must be less than or equal to {hi}"),
            (None, None) => format!("{field} is out of range"),
        },
        _ => format!("{field} is invalid"),
    }
}
