//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "steelsvc=debug,steelsvc_transport=debug"
    } else {
        "steelsvc=info,steelsvc_transport=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
