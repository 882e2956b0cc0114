use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Installs the process-wide `tracing` subscriber. The core itself never assumes a particular
/// sink is attached — every component emits through `tracing`'s macros and leaves the consumer
/// free to swap stdout for a JSON collector without touching this crate.
///
/// Safe to call more than once; subsequent calls are no-ops (the global subscriber can only be
/// set once per process).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}
