use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize JSON logging to stderr.
///
/// When `quiet` is true, only error-level events are emitted.
/// `RUST_LOG` directives are honored on top of the default.
pub fn init_logging(quiet: bool) {
    let directive = if quiet {
        "heimdall=error"
    } else {
        "heimdall=info"
    };

    // Target matching is prefix-based, so this covers heimdall_core as well.
    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = directive.parse() {
        filter = filter.add_directive(d);
    }

    // An already-installed global subscriber is left in place.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_does_not_panic() {
        init_logging(true);
        init_logging(false);
    }
}
