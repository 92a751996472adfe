use core_config::{ConfigError, FromEnv, env_parse_or, env_required};

pub const MIN_SECRET_LEN: usize = 32;

/// Token signing and lifetime settings.
///
/// Loaded from environment variables:
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_EXPIRES_IN_DAYS` (default: 90)
/// - `JWT_COOKIE_EXPIRES_IN_DAYS` (default: 90)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_days: i64,
    pub cookie_expires_in_days: i64,
}

impl JwtConfig {
    /// Build a config with default lifetimes, rejecting short secrets.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        check_secret(&secret)?;
        Ok(Self {
            secret,
            expires_in_days: 90,
            cookie_expires_in_days: 90,
        })
    }

    pub fn with_expiry_days(mut self, days: i64) -> Self {
        self.expires_in_days = days;
        self
    }
}

fn check_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::ParseError {
            key: "JWT_SECRET".to_string(),
            details: format!(
                "must be at least {MIN_SECRET_LEN} characters (got {}). Generate one with: openssl rand -base64 32",
                secret.len()
            ),
        });
    }
    Ok(())
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        check_secret(&secret)?;

        Ok(Self {
            secret,
            expires_in_days: env_parse_or("JWT_EXPIRES_IN_DAYS", 90)?,
            cookie_expires_in_days: env_parse_or("JWT_COOKIE_EXPIRES_IN_DAYS", 90)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "my-ultra-secure-and-ultra-long-secret";

    #[test]
    fn test_jwt_config_new_valid() {
        let config = JwtConfig::new(SECRET).unwrap();
        assert_eq!(config.secret, SECRET);
        assert_eq!(config.expires_in_days, 90);
    }

    #[test]
    fn test_jwt_config_new_too_short() {
        let err = JwtConfig::new("short").unwrap_err();
        assert!(err.to_string().contains("32 characters"));
    }

    #[test]
    fn test_jwt_config_from_env() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some(SECRET)),
                ("JWT_EXPIRES_IN_DAYS", Some("7")),
                ("JWT_COOKIE_EXPIRES_IN_DAYS", None),
            ],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.expires_in_days, 7);
                assert_eq!(config.cookie_expires_in_days, 90);
            },
        );
    }

    #[test]
    fn test_jwt_config_from_env_missing() {
        temp_env::with_var_unset("JWT_SECRET", || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn test_jwt_config_from_env_bad_expiry() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_EXPIRES_IN_DAYS", Some("90d"))],
            || {
                let err = JwtConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("JWT_EXPIRES_IN_DAYS"));
            },
        );
    }
}
