use axum::{
    Json, Router,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode, Uri, header},
    routing::{delete, get, patch, post},
};
use axum_extra::extract::cookie::CookieJar;
use axum_helpers::{
    AppError, AuthGuard, CurrentUser, JsonBody, UuidPath,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use resource_handler::{Envelope, ListQuery, Resource, ResourceHandlers};
use serde_json::{Value, json};
use utoipa::OpenApi;

use crate::models::{
    CreateUser, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, Role, SignupRequest,
    UpdateMeRequest, UpdatePasswordRequest, UpdateUser, User,
};
use crate::service::UserService;

/// Roles that manage other accounts.
pub const USER_ADMINS: &[&str] = &["admin"];

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        signup,
        login,
        logout,
        forgot_password,
        reset_password,
        update_password,
        get_me,
        update_me,
        delete_me,
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
    ),
    components(
        schemas(
            User,
            Role,
            CreateUser,
            UpdateUser,
            SignupRequest,
            LoginRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            UpdatePasswordRequest,
            UpdateMeRequest,
            Envelope
        ),
        responses(
            BadRequestResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "Accounts, authentication and user administration")
    )
)]
pub struct ApiDoc;

/// Create the users router.
///
/// Authentication endpoints are public, the `me` family needs a login and
/// the remaining CRUD is for admins.
pub fn router(service: UserService, guard: &AuthGuard) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/{token}", patch(reset_password))
        .route("/updateMyPassword", guard.protect(patch(update_password)))
        .route("/me", guard.protect(get(get_me)))
        .route("/updateMe", guard.protect(patch(update_me)))
        .route("/deleteMe", guard.protect(delete(delete_me)))
        .route(
            "/",
            guard.restrict(get(list_users).post(create_user), USER_ADMINS),
        )
        .route(
            "/{id}",
            guard.restrict(
                get(get_user).patch(update_user).delete(delete_user),
                USER_ADMINS,
            ),
        )
        .with_state(service)
}

type SessionResponse = (StatusCode, CookieJar, Json<Envelope>);

/// Token in the body and the cookie, user in `data`.
async fn send_session(
    service: &UserService,
    jar: CookieJar,
    user: &User,
    status: StatusCode,
) -> Result<SessionResponse, AppError> {
    let (token, cookie) = service.sessions().issue(user.id)?;
    let body = service.render(user).await?;
    Ok((
        status,
        jar.add(cookie),
        Json(Envelope::one(User::SINGULAR, body).with_token(token)),
    ))
}

/// `<scheme>://<host><mount>/resetPassword`, derived from the forgot-password request.
fn reset_url_base(https: bool, uri: &Uri, headers: &HeaderMap) -> String {
    let scheme = if https {
        "https"
    } else {
        "http"
    };
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path = uri.path().trim_end_matches('/');
    let mount = path.strip_suffix("/forgotPassword").unwrap_or(path);
    format!("{scheme}://{host}{mount}/resetPassword")
}

/// Sign up
#[utoipa::path(
    post,
    path = "/signup",
    tag = "Users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, token issued", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn signup(
    State(service): State<UserService>,
    jar: CookieJar,
    JsonBody(input): JsonBody<SignupRequest>,
) -> Result<SessionResponse, AppError> {
    let user = service.signup(input).await?;
    send_session(&service, jar, &user, StatusCode::CREATED).await
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, token issued", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login(
    State(service): State<UserService>,
    jar: CookieJar,
    JsonBody(input): JsonBody<LoginRequest>,
) -> Result<SessionResponse, AppError> {
    let user = service.login(input).await?;
    send_session(&service, jar, &user, StatusCode::OK).await
}

/// Log out by overwriting the token cookie
#[utoipa::path(
    get,
    path = "/logout",
    tag = "Users",
    responses((status = 200, description = "Cookie replaced", body = Envelope))
)]
async fn logout(State(service): State<UserService>, jar: CookieJar) -> (CookieJar, Json<Envelope>) {
    (jar.add(service.sessions().logout()), Json(Envelope::success()))
}

/// Email a password reset link
#[utoipa::path(
    post,
    path = "/forgotPassword",
    tag = "Users",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset token sent"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn forgot_password(
    State(service): State<UserService>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    JsonBody(input): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let https = service.sessions().environment().use_https();
    let base = reset_url_base(https, &uri, &headers);
    service.forgot_password(input.email.as_deref(), &base).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Token sent to email!"
    })))
}

/// Set a new password with an emailed token
#[utoipa::path(
    patch,
    path = "/resetPassword/{token}",
    tag = "Users",
    params(("token" = String, Path, description = "Raw reset token from the email")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed, token issued", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn reset_password(
    State(service): State<UserService>,
    jar: CookieJar,
    Path(token): Path<String>,
    JsonBody(input): JsonBody<ResetPasswordRequest>,
) -> Result<SessionResponse, AppError> {
    let user = service.reset_password(&token, input).await?;
    send_session(&service, jar, &user, StatusCode::OK).await
}

/// Change the current user's password
#[utoipa::path(
    patch,
    path = "/updateMyPassword",
    tag = "Users",
    request_body = UpdatePasswordRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Password changed, token issued", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_password(
    State(service): State<UserService>,
    CurrentUser(principal): CurrentUser,
    jar: CookieJar,
    JsonBody(input): JsonBody<UpdatePasswordRequest>,
) -> Result<SessionResponse, AppError> {
    let user = service.update_password(principal.id, input).await?;
    send_session(&service, jar, &user, StatusCode::OK).await
}

/// The current user
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = Envelope),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn get_me(
    State(service): State<UserService>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<Envelope>, AppError> {
    let user = service.handlers().get_one(principal.id).await?;
    Ok(Json(Envelope::one(User::SINGULAR, user)))
}

/// Update the current user's name, email or photo
#[utoipa::path(
    patch,
    path = "/updateMe",
    tag = "Users",
    request_body = UpdateMeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated user", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn update_me(
    State(service): State<UserService>,
    CurrentUser(principal): CurrentUser,
    JsonBody(input): JsonBody<UpdateMeRequest>,
) -> Result<Json<Envelope>, AppError> {
    let user = service.update_me(principal.id, input).await?;
    let body = service.render(&user).await?;
    Ok(Json(Envelope::one(User::SINGULAR, body)))
}

/// Deactivate the current user
#[utoipa::path(
    delete,
    path = "/deleteMe",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Account deactivated"),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn delete_me(
    State(service): State<UserService>,
    CurrentUser(principal): CurrentUser,
) -> Result<StatusCode, AppError> {
    service.delete_me(principal.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List users
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users matching the query", body = Envelope),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_users(
    state: State<ResourceHandlers<User>>,
    query: ListQuery,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::get_all::<User>(state, query).await
}

/// Create a user
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = CreateUser,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "User created", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn create_user(
    state: State<ResourceHandlers<User>>,
    body: JsonBody<CreateUser>,
) -> Result<(StatusCode, Json<Envelope>), AppError> {
    resource_handler::create_one::<User>(state, body).await
}

/// Get a user
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User found", body = Envelope),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_user(
    state: State<ResourceHandlers<User>>,
    id: UuidPath,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::get_one::<User>(state, id).await
}

/// Update a user. Passwords are not changed here.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User updated", body = Envelope),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_user(
    state: State<ResourceHandlers<User>>,
    id: UuidPath,
    body: JsonBody<UpdateUser>,
) -> Result<Json<Envelope>, AppError> {
    resource_handler::update_one::<User>(state, id, body).await
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_user(
    state: State<ResourceHandlers<User>>,
    id: UuidPath,
) -> Result<StatusCode, AppError> {
    resource_handler::delete_one::<User>(state, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_url_follows_the_mount_point() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "127.0.0.1:8000".parse().unwrap());
        let uri: Uri = "/api/v1/users/forgotPassword".parse().unwrap();

        assert_eq!(
            reset_url_base(false, &uri, &headers),
            "http://127.0.0.1:8000/api/v1/users/resetPassword"
        );
    }

    #[test]
    fn test_reset_url_without_host() {
        let uri: Uri = "/forgotPassword".parse().unwrap();
        assert_eq!(
            reset_url_base(true, &uri, &HeaderMap::new()),
            "https://localhost/resetPassword"
        );
    }
}
