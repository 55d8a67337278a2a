//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_conflict_retry, record_http_request,
    record_quota_update, PrometheusMetrics,
};
