use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when `RUST_LOG` is unset. Per-document `info` lines would tear
/// through the progress bar, so the bar drops the default to `warn`.
pub fn default_filter(configured_level: &str, progress: bool) -> &str {
    if progress {
        "warn"
    } else {
        configured_level
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(configured_level: &str, progress: bool) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| default_filter(configured_level, progress).into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
