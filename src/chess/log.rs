use std::env;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CHESS_LOG";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" | "trace" => Some(Self::Debug),
            _ => None,
        }
    }

    fn filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
        }
    }
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::default().add_directive(level.filter().into())
}

/// A level alias sets the global level; anything else is read as
/// `EnvFilter` directives such as `pgn_oracle=debug`.
fn filter_for(value: Option<&str>) -> EnvFilter {
    let Some(value) = value else {
        return level_filter(Level::Warn);
    };
    match Level::parse(value) {
        Some(level) => level_filter(level),
        None => EnvFilter::try_new(value).unwrap_or_else(|_| level_filter(Level::Warn)),
    }
}

/// Installs the stderr subscriber configured from `CHESS_LOG` (default `warn`).
pub fn init() {
    let configured = env::var(LOG_ENV).ok();
    let filter = filter_for(configured.as_deref());

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::{Level, filter_for};

    #[test]
    fn test_level_aliases() {
        assert_eq!(Level::parse("ERR"), Some(Level::Error));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse(" info "), Some(Level::Info));
        assert_eq!(Level::parse("trace"), Some(Level::Debug));
    }

    #[test]
    fn test_directives_are_not_levels() {
        assert_eq!(Level::parse("pgn_oracle=debug"), None);
        assert_eq!(Level::parse(""), None);
    }

    #[test]
    fn test_filter_accepts_unset_aliases_and_directives() {
        let _ = filter_for(None);
        let _ = filter_for(Some("info"));
        let _ = filter_for(Some("pgn_oracle=debug,warn"));
        let _ = filter_for(Some("=[bad"));
    }
}
