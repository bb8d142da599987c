//! Log setup for the load generator binary.

use std::env;
use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, prelude::*};

use crate::config::{LogFormat, Logging};

/// Installs the global log subscriber writing to stderr.
pub fn init_tracing(logging: &Logging) {
    let (level, env_filter) = parse_rust_log(logging.level);

    let format = match logging.format {
        LogFormat::Auto if std::io::stderr().is_terminal() => LogFormat::Pretty,
        LogFormat::Auto => LogFormat::Simplified,
        format => format,
    };

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    let fmt = match format {
        LogFormat::Json => fmt.json().boxed(),
        LogFormat::Simplified => fmt.compact().with_ansi(false).boxed(),
        LogFormat::Pretty | LogFormat::Auto => fmt.boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt.with_filter(level))
        .with(env_filter)
        .init();
}

/// Determines the maximum level and per-crate filter from `RUST_LOG`.
///
/// A plain level in `RUST_LOG` overrides the configured level. Anything else is used literally as
/// a filter directive.
pub fn parse_rust_log(configured: LevelFilter) -> (LevelFilter, EnvFilter) {
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        Err(_) => configured,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        mongodb=WARN,\
        loadmix=TRACE,\
        loadmix_store=TRACE,\
        ",
    );

    (level, env_filter)
}
