use std::io;
use std::string::FromUtf8Error;

use minijinja::ErrorKind;
use thiserror::Error;

use crate::arena_dom::ParseIssue;

/// Errors from [`crate::sanitizer::Sanitizer`]. The template filters never let these reach the
/// renderer; they turn them into an inline diagnostic instead.
#[derive(Error, Debug)]
pub enum SanitizeError {
    #[error("HTML parse error on line {}: {}", .0.line, .0.message)]
    Parse(ParseIssue),

    #[error("Unable to serialize sanitized markup: {0}")]
    Serialize(#[from] io::Error),

    #[error("Sanitized markup is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

/// Bad arguments given to a filter or function from a template.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("{filter} argument must look like \"<sep>pattern<sep>replacement\", got {spec:?}")]
    SeparatorSpec { filter: &'static str, spec: String },

    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("cannot {operation} {left} by {right}")]
    Arithmetic {
        operation: &'static str,
        left: String,
        right: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot read {0:?} as a date")]
    Date(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no size_css_bisect table named {0:?} in settings")]
    UnknownBisect(String),

    #[error("size_css_bisect table {0:?} must have exactly one more css entry than sizes")]
    MalformedBisect(String),

    #[error("{0} has no length")]
    NoLength(String),
}

impl From<FilterError> for minijinja::Error {
    fn from(err: FilterError) -> minijinja::Error {
        minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
    }
}
