//! Root key authentication extractor

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{DomainError, RootKey};
use crate::infrastructure::credential::secret_prefix;

/// Extractor that requires a valid root key in `Authorization: Bearer <key>`
#[derive(Debug, Clone)]
pub struct RequireRootKey(pub RootKey);

impl FromRequestParts<AppState> for RequireRootKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = extract_bearer_token(&parts.headers)?;

        debug!(key_prefix = %secret_prefix(secret), "Resolving root key");

        let root_key = state.credential_resolver.resolve(secret).await?;

        debug!(
            credential_id = %root_key.id(),
            workspace_id = %root_key.workspace_id(),
            "Root key authenticated"
        );

        Ok(RequireRootKey(root_key))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, DomainError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(DomainError::Unauthenticated)?
        .to_str()
        .map_err(|_| DomainError::Unauthenticated)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(DomainError::Unauthenticated)?;

    if token.is_empty() {
        return Err(DomainError::Unauthenticated);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        let headers = headers_with("Bearer rk_test-key-12345");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "rk_test-key-12345");
    }

    #[test]
    fn test_trimmed_token() {
        let headers = headers_with("Bearer   rk_with_spaces   ");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "rk_with_spaces");
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        let result = extract_bearer_token(&headers);
        assert!(matches!(result, Err(DomainError::Unauthenticated)));
    }

    #[test]
    fn test_non_bearer_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(DomainError::Unauthenticated)
        ));
    }

    #[test]
    fn test_empty_bearer() {
        let headers = headers_with("Bearer    ");
        assert!(extract_bearer_token(&headers).is_err());
    }
}
