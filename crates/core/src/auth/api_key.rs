use async_trait::async_trait;

use super::traits::{AuthError, Authenticator};
use super::types::{AuthRequest, Identity};

/// API-key authenticator: requires a matching `X-Api-Key` header or
/// `Authorization: Bearer` token.
pub struct ApiKeyAuthenticator {
    key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    fn extract_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        if let Some(key) = request.header("x-api-key") {
            return Some(key);
        }
        request
            .header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        if self.key.is_empty() {
            return Err(AuthError::ConfigurationError(
                "api_key auth enabled without a configured key".to_string(),
            ));
        }

        let presented = self
            .extract_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        if presented != self.key {
            return Err(AuthError::InvalidCredentials("key mismatch".to_string()));
        }

        Ok(Identity {
            user_id: "operator".to_string(),
            method: "api_key".to_string(),
        })
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request_with(name: &str, value: &str) -> AuthRequest {
        let mut headers = HashMap::new();
        headers.insert(name.to_lowercase(), value.to_string());
        AuthRequest { headers }
    }

    #[tokio::test]
    async fn test_valid_api_key_header() {
        let auth = ApiKeyAuthenticator::new("secret".to_string());
        let identity = auth
            .authenticate(&request_with("X-Api-Key", "secret"))
            .await
            .unwrap();
        assert_eq!(identity.method, "api_key");
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let auth = ApiKeyAuthenticator::new("secret".to_string());
        let identity = auth
            .authenticate(&request_with("Authorization", "Bearer secret"))
            .await
            .unwrap();
        assert_eq!(identity.user_id, "operator");
    }

    #[tokio::test]
    async fn test_wrong_key_rejected() {
        let auth = ApiKeyAuthenticator::new("secret".to_string());
        let err = auth
            .authenticate(&request_with("X-Api-Key", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_missing_key_rejected() {
        let auth = ApiKeyAuthenticator::new("secret".to_string());
        let err = auth
            .authenticate(&AuthRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_empty_configured_key_is_config_error() {
        let auth = ApiKeyAuthenticator::new(String::new());
        let err = auth
            .authenticate(&request_with("X-Api-Key", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ConfigurationError(_)));
    }
}
