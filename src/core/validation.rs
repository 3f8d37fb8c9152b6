use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// One leading digit 0-4, optionally followed by one or two decimals.
/// Only the leading digit is bounded, so "4.99" is accepted.
pub static GPA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-4](\.[0-9]{1,2})?$").expect("GPA pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Every failing field of a candidate, plus one human-readable summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<FieldError>) -> Self {
        let details = errors
            .iter()
            .map(|error| {
                if error.path.is_empty() {
                    error.message.clone()
                } else {
                    format!("{} at \"{}\"", error.message, error.path)
                }
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            message: format!("Validation error: {}", details),
            errors,
        }
    }

    /// A failure that cannot be tied to a single field, e.g. a body that is not an object.
    pub fn root(message: impl ToString) -> Self {
        Self::new(vec![FieldError {
            path: String::new(),
            message: message.to_string(),
        }])
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.errors.iter().any(|error| error.path == path)
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Flattens the errors of one struct into wire-named paths under `prefix`.
pub fn collect_field_errors(prefix: &str, errors: &ValidationErrors) -> Vec<FieldError> {
    let mut collected = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        let path = wire_path(prefix, field);
        for error in field_errors.iter() {
            collected.push(FieldError {
                path: path.clone(),
                message: describe(error),
            });
        }
    }
    collected.sort_by(|a, b| a.path.cmp(&b.path));
    collected
}

/// Builds a `ValidationError` carrying a display message, for custom rules.
pub fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => match error.code.as_ref() {
            "required" => "Required".to_string(),
            "email" => "Invalid email".to_string(),
            code => format!("Invalid value ({})", code),
        },
    }
}

fn wire_path(prefix: &str, field: &str) -> String {
    let name = to_camel_case(field);
    if prefix.is_empty() {
        name
    } else {
        format!("{}.{}", prefix, name)
    }
}

pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
