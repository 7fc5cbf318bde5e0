use std::net::SocketAddr;

use crate::session::Request;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: availability resolutions. Labels: mode, status.
pub const RESOLVE_TOTAL: &str = "chairtime_resolve_total";

/// Histogram: resolution latency in seconds. Labels: mode.
pub const RESOLVE_DURATION_SECONDS: &str = "chairtime_resolve_duration_seconds";

/// Histogram: bookable start times returned per resolution. Labels: mode.
pub const SLOTS_RETURNED: &str = "chairtime_slots_returned";

/// Counter: failed requests. Labels: kind.
pub const SCHEDULE_ERRORS_TOTAL: &str = "chairtime_schedule_errors_total";

/// Counter: session requests handled. Labels: op.
pub const REQUESTS_TOTAL: &str = "chairtime_requests_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: stylists known to the store.
pub const STYLISTS_ACTIVE: &str = "chairtime_stylists_active";

/// Gauge: current schedule version.
pub const SCHEDULE_VERSION: &str = "chairtime_schedule_version";

/// Counter: lookups served from the versioned cache.
pub const LOOKUP_CACHE_HITS_TOTAL: &str = "chairtime_lookup_cache_hits_total";

/// Counter: lookups computed from the stylist record.
pub const LOOKUP_CACHE_MISSES_TOTAL: &str = "chairtime_lookup_cache_misses_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a session request to a short label for metrics.
pub fn request_label(req: &Request) -> &'static str {
    match req {
        Request::Slots { .. } => "slots",
        Request::Validate { .. } => "validate",
        Request::SetSalonDay { .. } => "set_salon_day",
        Request::SetStylistDay { .. } => "set_stylist_day",
        Request::ClearStylistDay { .. } => "clear_stylist_day",
        Request::UpsertStylist { .. } => "upsert_stylist",
        Request::RemoveStylist { .. } => "remove_stylist",
        Request::UpsertService { .. } => "upsert_service",
        Request::RemoveService { .. } => "remove_service",
        Request::ListStylists => "list_stylists",
        Request::ListServices => "list_services",
        Request::Version => "version",
    }
}
