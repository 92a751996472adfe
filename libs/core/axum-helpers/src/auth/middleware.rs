use super::cookies::token_from_jar;
use super::jwt::JwtAuth;
use super::principal::{Principal, PrincipalResolver};
use crate::errors::{AppError, messages};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::MethodRouter,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Authenticates requests and enforces role restrictions.
///
/// ```ignore
/// let guard = AuthGuard::new(jwt, Arc::new(resolver));
///
/// let router = Router::new()
///     .route("/me", guard.protect(get(get_me)))
///     .route("/{id}", guard.restrict(delete(delete_tour), &["admin", "lead-guide"]));
/// ```
#[derive(Clone)]
pub struct AuthGuard {
    jwt: JwtAuth,
    resolver: Arc<dyn PrincipalResolver>,
}

/// Roles allowed through [`restrict_to`]
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [&'static str]);

impl AuthGuard {
    pub fn new(jwt: JwtAuth, resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self { jwt, resolver }
    }

    pub fn jwt(&self) -> &JwtAuth {
        &self.jwt
    }

    /// Resolve the principal behind the request's token.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AppError> {
        let token = extract_token(headers)
            .ok_or_else(|| AppError::Unauthenticated(messages::NOT_LOGGED_IN.to_string()))?;

        let claims = self.jwt.verify(&token)?;

        let principal = self
            .resolver
            .resolve(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthenticated(messages::USER_GONE.to_string()))?;

        if principal.changed_password_after(claims.iat) {
            return Err(AppError::Unauthenticated(
                messages::PASSWORD_CHANGED.to_string(),
            ));
        }

        Ok(principal)
    }

    /// Require a logged-in user on this route.
    pub fn protect<S>(&self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        route.route_layer(from_fn_with_state(self.clone(), protect))
    }

    /// Require a logged-in user whose role is in `roles`.
    pub fn restrict<S>(&self, route: MethodRouter<S>, roles: &'static [&'static str]) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        // Layers added last run first: authenticate, then check the role.
        route
            .route_layer(from_fn_with_state(AllowedRoles(roles), restrict_to))
            .route_layer(from_fn_with_state(self.clone(), protect))
    }
}

/// Bearer header first, then the `jwt` cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    bearer.or_else(|| token_from_jar(&CookieJar::from_headers(headers)))
}

/// Authenticates the request and stores the [`Principal`] in its extensions.
pub async fn protect(
    State(guard): State<AuthGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = guard.authenticate(request.headers()).await?;
    tracing::debug!(user_id = %principal.id, role = %principal.role, "request authenticated");

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Rejects principals whose role is not allowed. Must run after [`protect`].
pub async fn restrict_to(
    State(AllowedRoles(roles)): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::Unauthenticated(messages::NOT_LOGGED_IN.to_string()))?;

    if !principal.has_any_role(roles) {
        tracing::info!(user_id = %principal.id, role = %principal.role, ?roles, "role not allowed");
        return Err(AppError::Forbidden(messages::NO_PERMISSION.to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CurrentUser, JwtClaims, JwtConfig};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        routing::get,
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "my-ultra-secure-and-ultra-long-secret";

    struct StaticResolver(HashMap<String, Principal>);

    #[async_trait]
    impl PrincipalResolver for StaticResolver {
        async fn resolve(&self, subject: &str) -> Result<Option<Principal>, AppError> {
            Ok(self.0.get(subject).cloned())
        }
    }

    fn principal(role: &str, changed_hours_ago: Option<i64>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            name: "Test User".into(),
            email: format!("{role}@example.com"),
            role: role.into(),
            photo: None,
            password_changed_at: changed_hours_ago.map(|h| Utc::now() - Duration::hours(h)),
        }
    }

    async fn whoami(CurrentUser(user): CurrentUser) -> String {
        user.email
    }

    fn setup(users: Vec<Principal>) -> (Router, JwtAuth) {
        let jwt = JwtAuth::new(&JwtConfig::new(SECRET).unwrap());
        let resolver = StaticResolver(users.into_iter().map(|p| (p.id.to_string(), p)).collect());
        let guard = AuthGuard::new(jwt.clone(), Arc::new(resolver));

        let router = Router::new()
            .route("/me", guard.protect(get(whoami)))
            .route("/admin", guard.restrict(get(whoami), &["admin", "lead-guide"]));
        (router, jwt)
    }

    async fn call(router: Router, uri: &str, auth: Option<(&str, String)>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some((name, value)) = auth {
            builder = builder.header(name, value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (router, _) = setup(vec![]);
        let (status, body) = call(router, "/me", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(messages::NOT_LOGGED_IN));
    }

    #[tokio::test]
    async fn test_bearer_token_authenticates() {
        let user = principal("user", None);
        let (router, jwt) = setup(vec![user.clone()]);
        let token = jwt.sign(&user.id.to_string()).unwrap();

        let (status, body) = call(router, "/me", Some((header::AUTHORIZATION.as_str(), format!("Bearer {token}")))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user.email);
    }

    #[tokio::test]
    async fn test_cookie_token_authenticates() {
        let user = principal("user", None);
        let (router, jwt) = setup(vec![user.clone()]);
        let token = jwt.sign(&user.id.to_string()).unwrap();

        let (status, _) = call(router, "/me", Some((header::COOKIE.as_str(), format!("jwt={token}")))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_subject_no_longer_exists() {
        let (router, jwt) = setup(vec![]);
        let token = jwt.sign(&Uuid::new_v4().to_string()).unwrap();

        let (status, body) = call(router, "/me", Some((header::AUTHORIZATION.as_str(), format!("Bearer {token}")))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(messages::USER_GONE));
    }

    #[tokio::test]
    async fn test_token_issued_before_password_change_is_rejected() {
        let user = principal("user", Some(1));
        let (router, jwt) = setup(vec![user.clone()]);
        let issued = Utc::now() - Duration::hours(2);
        let token = jwt
            .sign_claims(&JwtClaims {
                sub: user.id.to_string(),
                iat: issued.timestamp(),
                exp: (issued + Duration::days(90)).timestamp(),
            })
            .unwrap();

        let (status, body) = call(router, "/me", Some((header::AUTHORIZATION.as_str(), format!("Bearer {token}")))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains(messages::PASSWORD_CHANGED));
    }

    #[tokio::test]
    async fn test_role_outside_allowed_set_is_forbidden() {
        let user = principal("user", None);
        let (router, jwt) = setup(vec![user.clone()]);
        let token = jwt.sign(&user.id.to_string()).unwrap();

        let (status, body) = call(router, "/admin", Some((header::AUTHORIZATION.as_str(), format!("Bearer {token}")))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains(messages::NO_PERMISSION));
    }

    #[tokio::test]
    async fn test_allowed_role_passes() {
        let admin = principal("admin", None);
        let (router, jwt) = setup(vec![admin.clone()]);
        let token = jwt.sign(&admin.id.to_string()).unwrap();

        let (status, _) = call(router, "/admin", Some((header::AUTHORIZATION.as_str(), format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_restricted_route_without_token_is_unauthorized() {
        let (router, _) = setup(vec![]);
        let (status, _) = call(router, "/admin", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
