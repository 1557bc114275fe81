//! Logging setup for the gatekeeper binary.
//!
//! Installs a `tracing` subscriber with an `EnvFilter` (default `info`) and the
//! fmt layer. Guarded by `OnceLock` so repeated calls from tests are harmless.
//! Metrics go through the `metrics` facade; no recorder is installed here, so
//! counters are no-ops unless the host process installs one.
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OBS_INIT: OnceLock<()> = OnceLock::new();

pub fn init_observability(service_name: &str) {
    OBS_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
        tracing::debug!(service = service_name, "logging initialized");
    });
}
