use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

/// Used when `RUST_LOG` is unset: this crate at info, dependencies at warn.
const DEFAULT_FILTER: &str = "warn,rawdev_rs=info";

/// Installs the global subscriber.
///
/// At debug level each pipeline stage span also logs its duration when it
/// closes.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let span_events = if wants_debug(&env_filter) {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events);

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

fn wants_debug(filter: &EnvFilter) -> bool {
    let directives = filter.to_string();
    directives.contains("debug") || directives.contains("trace")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_quiet_about_span_closes() {
        assert!(!wants_debug(&EnvFilter::new(DEFAULT_FILTER)));
        assert!(wants_debug(&EnvFilter::new("rawdev_rs=debug")));
        assert!(wants_debug(&EnvFilter::new("trace")));
    }
}
