use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use best_templatetags::config::settings::{self, install};
use best_templatetags::config::{AllowList, ConfigError, Settings};
use best_templatetags::logging::{init_logging, LogConfig};
use best_templatetags::{SanitizeError, Sanitizer, SanitizerConfig};
use clap::Parser;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "best-templatetags")]
#[command(about = "Sanitize HTML from stdin against a tag/attribute allow list")]
#[command(version)]
struct Cli {
    /// Allow spec such as "a:href:name b i"; defaults to sanitizetags_allowed from the settings
    #[arg(long)]
    allow: Option<String>,

    /// TOML settings file to install before sanitizing
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail on the first HTML parse error instead of recovering
    #[arg(long)]
    strict: bool,

    /// Log level used when TEMPLATETAGS_LOG and RUST_LOG are unset
    #[arg(long, default_value = "warn")]
    log_level: Level,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        default_level: cli.log_level,
    }) {
        eprintln!("warning: {}", err);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    if let Some(path) = cli.config.as_ref() {
        install(Settings::load(path)?);
    }
    let settings = settings::current();

    let spec = cli.allow.as_deref().unwrap_or(&settings.sanitizetags_allowed);
    let mut config = SanitizerConfig::new(AllowList::parse(spec));
    config.strict = cli.strict || settings.sanitize_strict;
    debug!(spec, strict = config.strict, "sanitizing stdin");

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let output = Sanitizer::new(config).sanitize_fragment(&input)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
