//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events. Binaries (and tests that want
//! output) call [`init_tracing`] once to install a subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install a global fmt subscriber
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `default_directive` (e.g. `"info"` or `"gapfinder_infra=debug"`).
/// Returns `false` when a global subscriber was already installed, in which
/// case the call has no effect.
pub fn init_tracing(default_directive: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
    };

    installed.is_ok()
}
