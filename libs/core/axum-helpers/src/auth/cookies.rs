use axum_extra::extract::cookie::{Cookie, CookieJar};
use core_config::Environment;
use time::Duration;

pub const TOKEN_COOKIE: &str = "jwt";
const LOGGED_OUT: &str = "loggedout";

/// HttpOnly cookie carrying a freshly issued token.
pub fn token_cookie(token: String, lifetime_days: i64, environment: Environment) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(environment.use_https())
        .path("/")
        .max_age(Duration::days(lifetime_days))
        .build()
}

/// Replaces the token with a placeholder that expires in ten seconds.
pub fn logout_cookie(environment: Environment) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, LOGGED_OUT))
        .http_only(true)
        .secure(environment.use_https())
        .path("/")
        .max_age(Duration::seconds(10))
        .build()
}

pub fn token_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE).map(|c| c.value().to_string())
}
