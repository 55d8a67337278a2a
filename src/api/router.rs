use axum::{middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::metrics_middleware;
use super::state::AppState;
use super::v1;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::infrastructure::credential::CredentialResolver;
    use crate::infrastructure::quota::QuotaService;
    use crate::infrastructure::storage::StorageFactory;

    fn test_state() -> AppState {
        let backends = StorageFactory::create_in_memory();

        AppState::new(
            Arc::new(QuotaService::new(backends.keys.clone())),
            Arc::new(CredentialResolver::new(backends.root_keys)),
            backends.keys,
        )
    }

    async fn get_status(uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

        create_router_with_state(test_state())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_probes() {
        assert_eq!(get_status("/health").await, StatusCode::OK);
        assert_eq!(get_status("/live").await, StatusCode::OK);
        assert_eq!(get_status("/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let request = Request::builder().uri("/live").body(Body::empty()).unwrap();

        let response = create_router_with_state(test_state())
            .oneshot(request)
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        assert_eq!(get_status("/v1/keys.delete").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_remaining_requires_post() {
        assert_eq!(
            get_status("/v1/keys.updateRemaining").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
