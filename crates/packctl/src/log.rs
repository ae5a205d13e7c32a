//! `tracing` init, mirroring the workspace's one log entry point per binary.

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Builds the env filter: `PACKCTL_LOG` wins if set, then the legacy
/// `NOMAD_PACK_LOG_LEVEL` variable (`spec §6` "External interfaces"), then
/// `RUST_LOG`, then `verbosity`.
fn env_filter(verbosity: Option<LevelFilter>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("PACKCTL_LOG") {
        return filter;
    }
    if let Ok(raw) = std::env::var("NOMAD_PACK_LOG_LEVEL")
        && let Ok(filter) = EnvFilter::builder().parse(&raw)
    {
        return filter;
    }
    EnvFilter::builder()
        .with_default_directive(verbosity.unwrap_or(LevelFilter::INFO).into())
        .from_env_lossy()
}

/// Initializes the global subscriber. `verbosity` comes from `-v` counting;
/// `None` means the environment (or `INFO`) decides.
pub fn init(verbosity: Option<LevelFilter>) {
    let filter = env_filter(verbosity);
    let verbose = filter.max_level_hint().is_some_and(|level| level > Level::INFO);

    let ignore_info_spans = filter_fn(move |metadata| {
        let is_trace_or_debug = || metadata.level() < &Level::INFO;
        verbose || !metadata.is_span() || is_trace_or_debug()
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .finish()
        .with(ignore_info_spans)
        .init();
}
