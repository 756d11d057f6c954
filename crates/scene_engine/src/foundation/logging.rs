//! Logging setup
//!
//! Everything logs through the `log` facade; `env_logger` is the default sink.

pub use log::{debug, error, info, trace, warn};

/// Initialize logging at `info`, overridable through `RUST_LOG`.
pub fn init() {
    init_with_level("info");
}

/// Initialize logging with a default filter such as `"debug"` or
/// `"scene_engine=trace"`. `RUST_LOG` still takes precedence.
///
/// Returns `false` if a logger was already installed.
pub fn init_with_level(level: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init()
        .is_ok()
}
