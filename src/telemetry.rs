use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `fallback` is used when `RUST_LOG` is unset.
pub fn init_telemetry(fallback: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("matchday_core={fallback},matchday={fallback}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
