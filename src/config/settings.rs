//! Process-wide defaults read by the filters and functions at call time.
//!
//! The initial value comes from [`Settings::from_env`]. Applications replace it with
//! [`install`], typically after [`Settings::load`]ing a TOML file:
//!
//! ```toml
//! sanitizetags_allowed = "a:href b i"
//!
//! [size_css_bisect.TITLE_SIZE_CSS_BISECT]
//! css = ["ts-big", "ts-normal", "ts-medium", "ts-small"]
//! size = [30, 50, 70]
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::default;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sanitizetags_allowed: String,
    pub sanitize_simple_html_tags: String,
    /// Show the inline diagnostic on any parse error instead of recovering.
    pub sanitize_strict: bool,
    pub size_css_bisect: HashMap<String, SizeCssBisect>,
}

/// Buckets a length into a css class: `size` holds ascending upper bounds and `css` holds one
/// more entry than `size`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SizeCssBisect {
    pub css: Vec<String>,
    pub size: Vec<usize>,
}

impl SizeCssBisect {
    pub fn is_well_formed(&self) -> bool {
        self.css.len() == self.size.len() + 1
    }

    /// Picks the class at the `bisect_right` position of `len` in `size`.
    pub fn css_for(&self, len: usize) -> Option<&str> {
        let index = self.size.partition_point(|&bound| bound <= len);
        self.css.get(index).map(String::as_str)
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            sanitizetags_allowed: default::SANITIZETAGS_ALLOWED.to_string(),
            sanitize_simple_html_tags: default::SANITIZE_SIMPLE_HTML_TAGS.to_string(),
            sanitize_strict: false,
            size_css_bisect: HashMap::new(),
        }
    }
}

impl Settings {
    /// Defaults, with the allow specs overridden by their environment variables when set.
    pub fn from_env() -> Settings {
        let mut settings = Settings::default();
        if let Ok(allowed) = env::var(default::SANITIZETAGS_ALLOWED_ENV) {
            settings.sanitizetags_allowed = allowed;
        }
        if let Ok(allowed) = env::var(default::SANITIZE_SIMPLE_HTML_TAGS_ENV) {
            settings.sanitize_simple_html_tags = allowed;
        }
        settings
    }

    pub fn from_toml_str(contents: &str) -> Result<Settings, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Settings::from_toml_str(&contents)?;
        debug!(target: "config", path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

lazy_static! {
    static ref CURRENT: RwLock<Arc<Settings>> = RwLock::new(Arc::new(Settings::from_env()));
}

pub fn current() -> Arc<Settings> {
    CURRENT.read().clone()
}

/// Replaces the process-wide settings, returning the previous ones.
pub fn install(settings: Settings) -> Arc<Settings> {
    info!(
        target: "config",
        sanitizetags_allowed = %settings.sanitizetags_allowed,
        size_css_bisect = settings.size_css_bisect.len(),
        "installing settings"
    );
    let mut current = CURRENT.write();
    std::mem::replace(&mut *current, Arc::new(settings))
}

#[cfg(test)]
lazy_static! {
    static ref TEST_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());
}

/// Serializes tests that install process-wide settings.
#[cfg(test)]
pub(crate) fn lock_for_test() -> parking_lot::MutexGuard<'static, ()> {
    TEST_LOCK.lock()
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parses_toml() {
        let settings = Settings::from_toml_str(
            r#"
            sanitizetags_allowed = "b i"
            sanitize_strict = true

            [size_css_bisect.TITLE]
            css = ["big", "normal", "small"]
            size = [30, 50]
            "#,
        )
        .unwrap();

        assert_eq!(settings.sanitizetags_allowed, "b i");
        assert!(settings.sanitize_strict);
        assert_eq!(
            settings.sanitize_simple_html_tags,
            default::SANITIZE_SIMPLE_HTML_TAGS
        );
        assert_eq!(
            settings.size_css_bisect["TITLE"],
            SizeCssBisect {
                css: vec!["big".into(), "normal".into(), "small".into()],
                size: vec![30, 50],
            }
        );
    }

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            Settings::from_toml_str("sanitizetags_allowed = [1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Settings::load("/nonexistent/best-templatetags.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/best-templatetags.toml"));
    }

    #[test]
    fn bisects_right() {
        let bisect = SizeCssBisect {
            css: vec!["big".into(), "normal".into(), "small".into()],
            size: vec![30, 50],
        };
        assert!(bisect.is_well_formed());
        assert_eq!(bisect.css_for(0), Some("big"));
        assert_eq!(bisect.css_for(29), Some("big"));
        assert_eq!(bisect.css_for(30), Some("normal"));
        assert_eq!(bisect.css_for(50), Some("small"));
        assert_eq!(bisect.css_for(500), Some("small"));
    }

    #[test]
    fn install_swaps_current_settings() {
        let _guard = lock_for_test();
        let mut settings = Settings::default();
        settings.sanitizetags_allowed = "em".to_string();

        let previous = install(settings);
        assert_eq!(current().sanitizetags_allowed, "em");

        install((*previous).clone());
        assert_eq!(current().sanitizetags_allowed, previous.sanitizetags_allowed);
    }

    #[test]
    fn from_env_reads_allow_overrides() {
        let _guard = lock_for_test();
        // CURRENT is built from the environment on first use; settle it before touching it.
        current();

        env::set_var(default::SANITIZETAGS_ALLOWED_ENV, "b i");
        env::set_var(default::SANITIZE_SIMPLE_HTML_TAGS_ENV, "p");
        let overridden = Settings::from_env();
        env::remove_var(default::SANITIZETAGS_ALLOWED_ENV);
        env::remove_var(default::SANITIZE_SIMPLE_HTML_TAGS_ENV);

        assert_eq!(overridden.sanitizetags_allowed, "b i");
        assert_eq!(overridden.sanitize_simple_html_tags, "p");
        assert!(!overridden.sanitize_strict);
        assert_eq!(Settings::from_env(), Settings::default());
    }
}
