use regex::Regex;

/// Whitespace, control characters and references to tab/newline/carriage return. Browsers skip
/// all of these when they read a URL scheme.
const SEPARATOR: &str = r"(?:[\s\x00-\x1f]|&#0*(?:9|10|13);?|&#x0*(?:9|a|d);?|&tab;|&newline;)*";

lazy_static! {
    static ref SCRIPT_SCHEME: Regex = Regex::new(&script_scheme_pattern("javascript:"))
        .expect("script scheme pattern is a valid regex");
}

/// Returns true if `value` starts with the `javascript:` scheme, however it is obfuscated with
/// case, interleaved whitespace or numeric character references.
pub fn is_script_scheme(value: &str) -> bool {
    SCRIPT_SCHEME.is_match(value)
}

fn script_scheme_pattern(scheme: &str) -> String {
    let letters = scheme.chars().map(encoded_char).collect::<Vec<_>>();
    format!("(?i)^{}{}", SEPARATOR, letters.join(SEPARATOR))
}

fn encoded_char(c: char) -> String {
    let mut alternatives = vec![regex::escape(&c.to_string())];
    let mut codes = vec![c as u32];
    if c.is_ascii_alphabetic() {
        codes.push(c.to_ascii_uppercase() as u32);
    }
    for code in codes {
        alternatives.push(format!("&#0*{};?", code));
        alternatives.push(format!("&#x0*{:x};?", code));
    }
    if c == ':' {
        alternatives.push("&colon;".to_string());
    }
    format!("(?:{})", alternatives.join("|"))
}
