//! Tracing bootstrap for pagesmith binaries.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber: `RUST_LOG` when set, `level`
/// otherwise, with plain or JSON line output. Later calls are no-ops
/// so tests may call this freely.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
}
