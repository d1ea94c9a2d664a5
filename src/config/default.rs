/// Allow spec used by `sanitizetags` when neither the template nor the settings give one.
pub const SANITIZETAGS_ALLOWED: &str =
    "a:href:name b u p i h1 h2 h3 hr img:src table tr td th code";

/// Allow spec used by `sanitize_simple_html`.
pub const SANITIZE_SIMPLE_HTML_TAGS: &str =
    "a:href b u p i h1 h2 h3 hr img:src table tr td th code";

pub const SANITIZETAGS_ALLOWED_ENV: &str = "SANITIZETAGS_ALLOWED";

pub const SANITIZE_SIMPLE_HTML_TAGS_ENV: &str = "SANITIZE_SIMPLE_HTML_TAGS";
