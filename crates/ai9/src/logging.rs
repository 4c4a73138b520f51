use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Extra directives appended after `--log-level`, e.g. `ai9_session=trace`.
const LOG_ENV: &str = "RUST_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives: the global level first, then any per-target overrides.
fn directives(level: LogLevel, env: Option<&str>) -> String {
    match env.map(str::trim).filter(|extra| !extra.is_empty()) {
        Some(extra) => format!("{},{extra}", level.directive()),
        None => level.directive().to_string(),
    }
}

/// Logs go to stderr so stdout stays clean for command output.
///
/// At `debug` and `trace` the target is shown, so the `recv`/`send` hex dumps
/// of the receive path and the session can be told apart.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::new(directives(level, env.as_deref()));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(level >= LogLevel::Debug);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_alone_sets_global_filter() {
        assert_eq!(directives(LogLevel::Warn, None), "warn");
        assert_eq!(directives(LogLevel::Debug, Some("  ")), "debug");
    }

    #[test]
    fn env_directives_refine_level() {
        assert_eq!(
            directives(LogLevel::Info, Some("ai9_session=debug")),
            "info,ai9_session=debug"
        );
    }

    #[test]
    fn debug_and_trace_are_verbose() {
        assert!(LogLevel::Debug > LogLevel::Info);
        assert!(LogLevel::Trace > LogLevel::Debug);
        assert!(LogLevel::Error < LogLevel::Warn);
    }
}
