//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use realty_agent_config::Settings;

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("realty_agent={},tower_http=debug", level).into())
}

/// Server logging: `RUST_LOG`, else the configured level; plain or JSON
pub fn init_tracing(config: &Settings) {
    let subscriber = tracing_subscriber::registry().with(env_filter(&config.observability.log_level));
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

/// Terminal logging goes to stderr and stays quiet unless asked
pub fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
