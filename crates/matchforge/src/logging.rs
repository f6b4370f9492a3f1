//! Tracing setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
    init_with(DEFAULT_FILTER);
}

/// Like [`init`], with a custom fallback filter such as
/// `"info,matchforge_room=debug"`.
pub fn init_with(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());
    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
