//! Metric names emitted by the cache. Every series carries a `module` label.

pub const METRIC_CACHE_HIT: &str = "portico_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "portico_cache_miss_total";
pub const METRIC_CACHE_REBUILD: &str = "portico_cache_rebuild_total";
pub const METRIC_CACHE_REBUILD_FAILED: &str = "portico_cache_rebuild_failed_total";
pub const METRIC_CACHE_REBUILD_MS: &str = "portico_cache_rebuild_ms";
pub const METRIC_CACHE_STALE_SERVED: &str = "portico_cache_stale_served_total";
pub const METRIC_CACHE_FALLBACK_SERVED: &str = "portico_cache_fallback_served_total";
pub const METRIC_CACHE_STORE_ERROR: &str = "portico_cache_store_error_total";
pub const METRIC_CACHE_PURGE: &str = "portico_cache_purge_total";
pub const METRIC_CACHE_PURGE_FAILED: &str = "portico_cache_purge_failed_total";
