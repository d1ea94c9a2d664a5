use std::borrow::Cow;

use minijinja::Error;
use regex::{Regex, RegexBuilder};

use crate::error::FilterError;

pub fn basename(path: String) -> String {
    match path.rfind('/') {
        Some(index) => path[index + 1..].to_string(),
        None => path,
    }
}

/// Everything before the last `/`, with trailing slashes trimmed unless the head is only slashes.
pub fn dirname(path: String) -> String {
    let head = match path.rfind('/') {
        Some(index) => &path[..=index],
        None => return String::new(),
    };
    let trimmed = head.trim_end_matches('/');
    if trimmed.is_empty() {
        head.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Splits a `<sep>first<sep>second[<sep>...]` argument on its own first character.
fn split_on_separator<'a>(filter: &'static str, spec: &'a str) -> Result<Vec<&'a str>, FilterError> {
    let separator = spec.chars().next().ok_or_else(|| FilterError::SeparatorSpec {
        filter,
        spec: spec.to_string(),
    })?;
    let parts = spec.split(separator).collect::<Vec<_>>();
    if parts.len() < 3 {
        return Err(FilterError::SeparatorSpec {
            filter,
            spec: spec.to_string(),
        });
    }
    Ok(parts)
}

/// `{{ path|replace_sep(",/home,/Users") }}`
pub fn replace_sep(value: String, spec: String) -> Result<String, Error> {
    let parts = split_on_separator("replace_sep", &spec)?;
    Ok(value.replace(parts[1], parts[2]))
}

/// `{{ path|resub(",/home/([^/]*)/projects,login=\\1") }}`; a trailing `<sep>i` segment makes
/// the pattern case-insensitive.
pub fn resub(value: String, spec: String) -> Result<String, Error> {
    let parts = split_on_separator("resub", &spec)?;
    let case_insensitive = parts.len() > 3 && parts[parts.len() - 1] == "i";
    let regex = RegexBuilder::new(parts[1])
        .case_insensitive(case_insensitive)
        .build()
        .map_err(FilterError::from)?;
    let replacement = expand_backreferences(parts[2]);
    Ok(regex.replace_all(&value, &*replacement).into_owned())
}

/// Removes each match of `pattern` along with the rest of its line.
pub fn truncat(value: String, pattern: String) -> Result<String, Error> {
    let regex = Regex::new(&format!("(?:{}).*", pattern)).map_err(FilterError::from)?;
    Ok(regex.replace_all(&value, "").into_owned())
}

/// Rewrites `\1`, `\g<name>` and `\n`/`\t` style escapes into the regex crate's `${1}` syntax,
/// escaping literal `$`.
fn expand_backreferences(replacement: &str) -> Cow<'_, str> {
    if !replacement.contains('\\') && !replacement.contains('$') {
        return Cow::Borrowed(replacement);
    }

    let mut expanded = String::with_capacity(replacement.len() + 8);
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => expanded.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(digit) if digit.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(&digit) = chars.peek() {
                        if !digit.is_ascii_digit() {
                            break;
                        }
                        group.push(digit);
                        chars.next();
                    }
                    expanded.push_str(&format!("${{{}}}", group));
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name = chars.by_ref().take_while(|&c| c != '>').collect::<String>();
                        expanded.push_str(&format!("${{{}}}", name));
                    } else {
                        expanded.push_str("\\g");
                    }
                }
                Some('n') => {
                    chars.next();
                    expanded.push('\n');
                }
                Some('t') => {
                    chars.next();
                    expanded.push('\t');
                }
                Some('\\') => {
                    chars.next();
                    expanded.push('\\');
                }
                _ => expanded.push('\\'),
            },
            other => expanded.push(other),
        }
    }
    Cow::Owned(expanded)
}
