use std::time::Instant;

use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

pub fn call_summary(method: &str, id: &str, status: Option<u16>, started_at: Instant) {
    let elapsed_ms = started_at.elapsed().as_millis();

    match status {
        Some(status) => info!(
            method = %method,
            id = %id,
            status,
            duration_ms = elapsed_ms,
            "call summary"
        ),
        None => warn!(
            method = %method,
            id = %id,
            duration_ms = elapsed_ms,
            "call failed before a reply was received"
        ),
    }
}
