//! Key endpoints

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::middleware::RequireRootKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{evaluate, Capability, DomainError, KeyId, QuotaOperation};

/// Body of `POST /v1/keys.updateRemaining`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRemainingRequest {
    pub key_id: String,
    pub op: String,
    /// Validated against the operation after authorization
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateRemainingResponse {
    /// `null` when the key stays unlimited
    pub remaining: Option<i64>,
}

/// Increment, decrement or set the remaining-usage counter of a key
pub async fn update_remaining(
    State(state): State<AppState>,
    RequireRootKey(root_key): RequireRootKey,
    Json(request): Json<UpdateRemainingRequest>,
) -> Result<Json<UpdateRemainingResponse>, ApiError> {
    let key_id = KeyId::new(&request.key_id)
        .map_err(|e| DomainError::validation("keyId", e.to_string()))?;

    let required = Capability::update_key(&key_id);
    if !evaluate(root_key.scopes(), &required).is_granted() {
        debug!(
            credential_id = %root_key.id(),
            required = %required,
            "Root key lacks permission"
        );
        return Err(DomainError::unauthorized(required.to_string()).into());
    }

    let operation = QuotaOperation::parse(&request.op, &request.value)?;

    let update = state
        .quota_service
        .apply(root_key.workspace_id(), &key_id, operation)
        .await?;

    Ok(Json(UpdateRemainingResponse {
        remaining: update.remaining,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::api::router::create_router_with_state;
    use crate::api::state::{AppState, MockQuotaServiceTrait};
    use crate::domain::{Key, KeyAuthId, KeyRepository, RootKey, RootKeyId, RootKeyRepository, WorkspaceId};
    use crate::infrastructure::credential::{
        CredentialResolver, InMemoryRootKeyRepository, RootKeyGenerator,
    };
    use crate::infrastructure::key::InMemoryKeyRepository;
    use crate::infrastructure::quota::QuotaService;

    use super::*;

    struct TestApp {
        router: Router,
        keys: InMemoryKeyRepository,
        secret: String,
    }

    async fn seed_root_key(
        repository: &InMemoryRootKeyRepository,
        scopes: &[&str],
    ) -> String {
        let generated = RootKeyGenerator::default().generate();
        let root_key = RootKey::new(
            RootKeyId::generate(),
            WorkspaceId::new("ws_1"),
            "root",
            generated.hash,
            generated.prefix,
        )
        .with_scopes(scopes.iter().copied());

        repository.create(root_key).await.unwrap();
        generated.key
    }

    fn limited_key(id: &str, workspace: &str, remaining: i64) -> Key {
        Key::new(
            KeyId::new(id).unwrap(),
            KeyAuthId::new("ks_1"),
            WorkspaceId::new(workspace),
            "key_abc",
            format!("sha256${}", id),
        )
        .with_remaining(remaining)
    }

    async fn test_app(scopes: &[&str]) -> TestApp {
        let keys = InMemoryKeyRepository::with_keys([
            limited_key("key_1", "ws_1", 100),
            limited_key("key_other", "ws_2", 100),
        ]);
        let root_keys = InMemoryRootKeyRepository::new();
        let secret = seed_root_key(&root_keys, scopes).await;

        let key_repository: Arc<dyn KeyRepository> = Arc::new(keys.clone());
        let state = AppState::new(
            Arc::new(QuotaService::new(key_repository.clone())),
            Arc::new(CredentialResolver::new(Arc::new(root_keys))),
            key_repository,
        );

        TestApp {
            router: create_router_with_state(state),
            keys,
            secret,
        }
    }

    fn update_request(secret: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/keys.updateRemaining")
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(secret) = secret {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", secret));
        }

        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn remaining_of(app: &TestApp, id: &str) -> Option<i64> {
        app.keys
            .find_by_id(&KeyId::new(id).unwrap())
            .await
            .unwrap()
            .unwrap()
            .remaining()
    }

    const WILDCARD: &[&str] = &["api.*.update_key"];

    #[tokio::test]
    async fn test_increment() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "increment", "value": 10 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "remaining": 110 }));
    }

    #[tokio::test]
    async fn test_decrement() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "decrement", "value": 10 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "remaining": 90 }));
    }

    #[tokio::test]
    async fn test_set() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "set", "value": 10 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "remaining": 10 }));
    }

    #[tokio::test]
    async fn test_unknown_op_leaves_counter() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "XXX", "value": 10 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["param"], "op");
        assert_eq!(remaining_of(&app, "key_1").await, Some(100));
    }

    #[tokio::test]
    async fn test_non_integer_value_rejected() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "increment", "value": "10" }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["param"], "value");
        assert_eq!(remaining_of(&app, "key_1").await, Some(100));
    }

    #[tokio::test]
    async fn test_decrement_below_zero() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "decrement", "value": 101 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "insufficient_remaining"
        );
        assert_eq!(remaining_of(&app, "key_1").await, Some(100));
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            None,
            json!({ "keyId": "key_1", "op": "increment", "value": 1 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_credential() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some("rk_not_a_real_key"),
            json!({ "keyId": "key_1", "op": "increment", "value": 1 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(remaining_of(&app, "key_1").await, Some(100));
    }

    #[tokio::test]
    async fn test_missing_permission() {
        let app = test_app(&["api.*.read_key"]).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "set", "value": 1 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(remaining_of(&app, "key_1").await, Some(100));
    }

    #[tokio::test]
    async fn test_exact_scope_for_other_key_denied() {
        let app = test_app(&["api.key_2.update_key"]).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_1", "op": "increment", "value": 1 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_key_in_other_workspace_not_found() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key_other", "op": "set", "value": 1 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(remaining_of(&app, "key_other").await, Some(100));
    }

    #[tokio::test]
    async fn test_invalid_key_id() {
        let app = test_app(WILDCARD).await;
        let request = update_request(
            Some(&app.secret),
            json!({ "keyId": "key.1", "op": "set", "value": 1 }),
        );

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["param"], "keyId");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let app = test_app(WILDCARD).await;
        let request = Request::builder()
            .method("POST")
            .uri("/v1/keys.updateRemaining")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", app.secret))
            .body(Body::from("{\"keyId\": "))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_unresolved_conflict_is_unavailable() {
        let root_keys = InMemoryRootKeyRepository::new();
        let secret = seed_root_key(&root_keys, WILDCARD).await;

        let mut quota_service = MockQuotaServiceTrait::new();
        quota_service
            .expect_apply()
            .returning(|_, _, _| Err(DomainError::conflict("serialization failure")));

        let state = AppState::new(
            Arc::new(quota_service),
            Arc::new(CredentialResolver::new(Arc::new(root_keys))),
            Arc::new(InMemoryKeyRepository::new()),
        );
        let request = update_request(
            Some(&secret),
            json!({ "keyId": "key_1", "op": "increment", "value": 1 }),
        );

        let response = create_router_with_state(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
