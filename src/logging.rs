//! Log output
//!
//! Library code only emits `tracing` events; the binary decides where they
//! go by calling [`init`] once at startup.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over `filter`; an
/// unparsable `filter` falls back to `info`.
///
/// Returns false if a subscriber was already installed.
pub fn init(filter: &str) -> bool {
    let (env_filter, rejected) = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => (env_filter, false),
        Err(_) => match EnvFilter::try_new(filter) {
            Ok(env_filter) => (env_filter, false),
            Err(_) => (EnvFilter::new("info"), true),
        },
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed && rejected {
        tracing::warn!(filter, "invalid log filter, using info");
    }
    installed
}
