//! Logging setup. Warnings by default; `VBS2CS_DEBUG=1` or `--verbose` raises the level
//! to DEBUG so every pipeline stage reports what it produced.
use std::sync::OnceLock;

use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

static ENABLED: OnceLock<bool> = OnceLock::new();

pub fn is_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("VBS2CS_DEBUG").ok().as_deref() == Some("1"))
}

/// Installs the global subscriber (`[LEVEL] message` on stderr). Safe to call twice; the
/// second call is a no-op.
pub fn init_logging(verbose: bool) {
    let level = if verbose || is_enabled() { tracing::Level::DEBUG } else { tracing::Level::WARN };
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_level(true)
        .compact()
        .with_filter(LevelFilter::from_level(level));
    let _ = Registry::default().with(layer).try_init();
}
