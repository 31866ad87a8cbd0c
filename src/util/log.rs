use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Install the global tracing subscriber: fmt output with an env filter.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Each binary
/// passes its own default so one-shot jobs stay quiet unless asked.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
