mod api_key;
mod none;
mod traits;
mod types;

pub use api_key::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Box<dyn Authenticator> {
    match config.method {
        AuthMethod::None => Box::new(NoneAuthenticator::new()),
        AuthMethod::ApiKey => Box::new(ApiKeyAuthenticator::new(
            config.api_key.clone().unwrap_or_default(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_authenticator_none() {
        let auth = create_authenticator(&AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        });
        assert_eq!(auth.method_name(), "none");
    }

    #[test]
    fn test_create_authenticator_api_key() {
        let auth = create_authenticator(&AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some("secret".to_string()),
        });
        assert_eq!(auth.method_name(), "api_key");
    }
}
