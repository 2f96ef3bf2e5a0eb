//! `tracing-subscriber` initialization, mirroring the reference crate's
//! `--debug`/`--verbose`/`--quiet` level selection with `RUST_LOG` taking
//! precedence when set.

use tracing_subscriber::{fmt, EnvFilter};

pub struct LogLevel {
    pub debug: bool,
    pub verbose: bool,
    pub quiet: bool,
}

pub fn init(level: &LogLevel) {
    let default_level = if level.debug {
        "debug"
    } else if level.verbose {
        "info"
    } else if level.quiet {
        "error"
    } else {
        "warn"
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
}
