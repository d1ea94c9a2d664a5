use html_escape::{encode_quoted_attribute, encode_text};
use minijinja::value::Value;
use minijinja::{AutoEscape, State};
use tracing::warn;

use crate::config::settings::{self, Settings};
use crate::config::AllowList;
use crate::error::SanitizeError;
use crate::sanitizer::{Sanitizer, SanitizerConfig};

const PARSE_HINT: &str = "Unable to parse the HTML text you gave. Please, check your syntax";

/// Sanitizes `markup` against `spec`, or against `sanitizetags_allowed` from the current settings
/// when no spec is given.
///
/// Never fails: markup the sanitizer rejects comes back as an escaped, line-numbered diagnostic.
pub fn sanitize_markup(markup: &str, spec: Option<&str>) -> String {
    let settings = settings::current();
    let spec = spec.unwrap_or(&settings.sanitizetags_allowed);
    sanitize_markup_with(markup, spec, &settings)
}

pub fn sanitize_markup_with(markup: &str, spec: &str, settings: &Settings) -> String {
    let mut config = SanitizerConfig::new(AllowList::parse(spec));
    config.strict = settings.sanitize_strict;

    match Sanitizer::new(config).sanitize_fragment(markup) {
        Ok(sanitized) => sanitized,
        Err(err) => {
            warn!(error = %err, "rendering diagnostic instead of sanitized markup");
            diagnostic(&err, markup)
        }
    }
}

fn diagnostic(err: &SanitizeError, markup: &str) -> String {
    format!(
        "<br><span class=\"warning\">{} :<br>{}</span><br><pre class=\"sanitizetags\">{}</pre>",
        encode_text(&err.to_string()),
        PARSE_HINT,
        numbered_lines(markup)
    )
}

fn numbered_lines(text: &str) -> String {
    let lines = text.split('\n').collect::<Vec<_>>();
    let width = lines.len().to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| format!("{:0width$}. {}", index + 1, encode_text(line), width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `{{ comment|sanitizetags }}` or `{{ comment|sanitizetags("a:href b i") }}`
pub fn sanitizetags(value: String, allowed: Option<String>) -> Value {
    Value::from_safe_string(sanitize_markup(&value, allowed.as_deref()))
}

pub fn sanitize(value: String, allowed: String) -> Value {
    Value::from_safe_string(sanitize_markup(&value, Some(&allowed)))
}

pub fn sanitize_simple_html(value: String) -> Value {
    let settings = settings::current();
    Value::from_safe_string(sanitize_markup_with(
        &value,
        &settings.sanitize_simple_html_tags,
        &settings,
    ))
}

/// The text of `value`, escaped unless it is already safe or the template does not autoescape.
fn escaped_text(state: &State, value: &Value) -> String {
    let text = value.to_string();
    if value.is_safe() || matches!(state.auto_escape(), AutoEscape::None) {
        text
    } else {
        encode_quoted_attribute(&text).into_owned()
    }
}

pub fn nl2br(state: &State, value: Value) -> Value {
    let text = escaped_text(state, &value);
    Value::from_safe_string(text.replace("\r\n", "<br>").replace('\n', "<br>"))
}

pub fn nbsp(state: &State, value: Value) -> Value {
    let text = escaped_text(state, &value);
    Value::from_safe_string(text.replace(' ', "&nbsp;"))
}
