use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::metrics::{
    METRIC_CACHE_FALLBACK_SERVED, METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_PURGE,
    METRIC_CACHE_PURGE_FAILED, METRIC_CACHE_REBUILD, METRIC_CACHE_REBUILD_FAILED,
    METRIC_CACHE_REBUILD_MS, METRIC_CACHE_STALE_SERVED, METRIC_CACHE_STORE_ERROR,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register units and help text for the cache series with the installed
/// recorder. Safe to call more than once.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Reads served from a fresh snapshot."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Reads that found no fresh snapshot."
        );
        describe_counter!(
            METRIC_CACHE_REBUILD,
            Unit::Count,
            "Snapshots rebuilt from the origin store."
        );
        describe_counter!(
            METRIC_CACHE_REBUILD_FAILED,
            Unit::Count,
            "Rebuilds whose loader failed or timed out."
        );
        describe_histogram!(
            METRIC_CACHE_REBUILD_MS,
            Unit::Milliseconds,
            "Loader plus store latency of a rebuild in milliseconds."
        );
        describe_counter!(
            METRIC_CACHE_STALE_SERVED,
            Unit::Count,
            "Reads answered with an expired snapshot after a failed rebuild."
        );
        describe_counter!(
            METRIC_CACHE_FALLBACK_SERVED,
            Unit::Count,
            "Reads answered with the module's static default."
        );
        describe_counter!(
            METRIC_CACHE_STORE_ERROR,
            Unit::Count,
            "Snapshot store operations that failed."
        );
        describe_counter!(
            METRIC_CACHE_PURGE,
            Unit::Count,
            "Snapshots invalidated after a content write or operator request."
        );
        describe_counter!(
            METRIC_CACHE_PURGE_FAILED,
            Unit::Count,
            "Purges that could not reach the snapshot store."
        );
    });
}
