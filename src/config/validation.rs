use crate::config::types::AuditConfig;
use crate::{ConfigError, ConfigResult};

/// Validates an audit configuration
///
/// Checks the ranges that would otherwise produce a silently broken run:
/// a zero timeout hangs forever on some platforms, a backoff factor below
/// 1.0 makes retry sleeps shrink, and a zero worker count never schedules
/// anything.
pub fn validate(config: &AuditConfig) -> ConfigResult<()> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent must not be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than 0".to_string(),
        ));
    }

    if config.retry_backoff < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry-backoff must be at least 1.0, got {}",
            config.retry_backoff
        )));
    }

    if config.max_concurrent == 0 {
        return Err(ConfigError::Validation(
            "max-concurrent must be greater than 0".to_string(),
        ));
    }

    if let Some(auth) = &config.basic_auth {
        if auth.username.is_empty() {
            return Err(ConfigError::Validation(
                "basic-auth.username must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::BasicAuth;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&AuditConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let config = AuditConfig {
            user_agent: "  ".to_string(),
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AuditConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_backoff_below_one_rejected() {
        let config = AuditConfig {
            retry_backoff: 0.5,
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_backoff_of_one_allowed() {
        let config = AuditConfig {
            retry_backoff: 1.0,
            ..Default::default()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = AuditConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_auth_username_rejected() {
        let config = AuditConfig {
            basic_auth: Some(BasicAuth {
                username: String::new(),
                password: "secret".to_string(),
            }),
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }
}
