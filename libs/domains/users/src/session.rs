use axum_extra::extract::cookie::Cookie;
use axum_helpers::auth::{logout_cookie, token_cookie};
use axum_helpers::{AppError, JwtAuth, JwtConfig};
use core_config::Environment;
use uuid::Uuid;

/// Issues the token and cookie pair returned by every login-like response.
#[derive(Clone)]
pub struct Sessions {
    jwt: JwtAuth,
    cookie_expires_in_days: i64,
    environment: Environment,
}

impl Sessions {
    pub fn new(config: &JwtConfig, environment: Environment) -> Self {
        Self::from_parts(JwtAuth::new(config), config.cookie_expires_in_days, environment)
    }

    /// Share an existing signer, e.g. the one behind the auth guard.
    pub fn from_parts(jwt: JwtAuth, cookie_expires_in_days: i64, environment: Environment) -> Self {
        Self {
            jwt,
            cookie_expires_in_days,
            environment,
        }
    }

    pub fn jwt(&self) -> &JwtAuth {
        &self.jwt
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn issue(&self, user_id: Uuid) -> Result<(String, Cookie<'static>), AppError> {
        let token = self.jwt.sign(&user_id.to_string())?;
        let cookie = token_cookie(token.clone(), self.cookie_expires_in_days, self.environment);
        Ok((token, cookie))
    }

    pub fn logout(&self) -> Cookie<'static> {
        logout_cookie(self.environment)
    }
}
