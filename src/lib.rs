//! Extra filters and functions for [minijinja] templates, built around an html5ever based tag
//! sanitizer.
//!
//! ```
//! use minijinja::{context, Environment};
//!
//! let mut env = Environment::new();
//! best_templatetags::register(&mut env);
//!
//! let output = env
//!     .render_str(
//!         r#"{{ comment|sanitizetags("a:href b") }}"#,
//!         context! { comment => r#"<b>hi</b> <a href="javascript:x()" id="y">there</a>"# },
//!     )
//!     .unwrap();
//! assert_eq!(output, "<b>hi</b> <a>there</a>");
//! ```
#![warn(clippy::all)]
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate html5ever;

pub mod arena_dom;
pub mod config;
pub mod error;
pub mod filters;
pub mod functions;
pub mod logging;
pub mod sanitizer;
pub mod scheme;

use minijinja::Environment;

pub use crate::config::{AllowList, Settings};
pub use crate::error::{FilterError, SanitizeError};
pub use crate::filters::{sanitize_markup, sanitize_markup_with};
pub use crate::sanitizer::{Sanitizer, SanitizerConfig};

/// Adds every filter and global function of this crate to `env`.
pub fn register(env: &mut Environment<'_>) {
    filters::register(env);
    functions::register(env);
}
