use async_trait::async_trait;

use super::traits::{AuthError, Authenticator};
use super::types::{AuthRequest, Identity};

/// Pass-through authenticator: every request is anonymous.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(Identity::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_anonymous() {
        let auth = NoneAuthenticator::new();
        let identity = auth.authenticate(&AuthRequest::default()).await.unwrap();
        assert_eq!(identity.user_id, "anonymous");
    }
}
