//! Logging setup: stdout formatting driven by an `EnvFilter`. No file
//! rotation — a stateless HTTP service has no operational need for it.

use tracing_subscriber::{EnvFilter, fmt};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
