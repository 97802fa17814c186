use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - api_key auth has a key configured
/// - Matching thresholds are in range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key is required for the api_key method".to_string(),
        ));
    }

    let fuzzy = config.matching.fuzzy_size_factor;
    if !(0.0..=1.0).contains(&fuzzy) {
        return Err(ConfigError::ValidationError(format!(
            "matching.fuzzy_size_factor must be within [0, 1], got {}",
            fuzzy
        )));
    }

    let ratio = config.matching.min_size_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "matching.min_size_ratio must be within (0, 1], got {}",
            ratio
        )));
    }

    Ok(())
}
