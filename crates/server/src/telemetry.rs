//! Structured logging init (spec.md §6). No OTel/collector pipeline --
//! the spec's non-goal excludes the telemetry *pipeline*, not structured
//! logs/metrics themselves (SPEC_FULL.md §1). Plain `tracing-subscriber`
//! with an env-filter, the same shape `acteon-server::main` uses before
//! layering its (dropped-here) OTel exporter on top.

pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
