use axum::extract::FromRef;
use chrono::{Duration, Utc};
use domain_notifications::{NotificationService, RESET_TOKEN_TTL_MINUTES};
use resource_handler::{Repository, ResourceError, ResourceHandlers};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{
    CreateUser, LoginRequest, ResetPasswordRequest, SignupRequest, UpdateMeRequest, UpdatePasswordRequest, User,
};
use crate::password::{hash_reset_token, new_reset_token, verify_password};
use crate::repository::UserRepository;
use crate::session::Sessions;

/// Account flows: signup, login, password reset and self-service updates.
#[derive(Clone)]
pub struct UserService {
    handlers: ResourceHandlers<User>,
    users: UserRepository,
    sessions: Sessions,
    notifications: NotificationService,
}

impl UserService {
    pub fn new(repository: Repository<User>, sessions: Sessions, notifications: NotificationService) -> Self {
        Self {
            users: UserRepository::new(repository.clone()),
            handlers: ResourceHandlers::new(repository),
            sessions,
            notifications,
        }
    }

    pub fn handlers(&self) -> &ResourceHandlers<User> {
        &self.handlers
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// JSON for `user` without hidden fields.
    pub async fn render(&self, user: &User) -> UserResult<Value> {
        Ok(self.handlers.render_entity(user).await?)
    }

    /// Create a `user` account. The welcome email is best effort.
    #[instrument(skip(self, input))]
    pub async fn signup(&self, input: SignupRequest) -> UserResult<User> {
        let user = self.handlers.create_one(CreateUser::from(input)).await?;

        if let Err(e) = self.notifications.send_welcome(&user.email, &user.name).await {
            tracing::warn!(user_id = %user.id, error = %e, "failed to send welcome email");
        }

        Ok(user)
    }

    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<User> {
        let (Some(email), Some(password)) = (input.email, input.password) else {
            return Err(UserError::MissingCredentials);
        };
        if email.trim().is_empty() || password.is_empty() {
            return Err(UserError::MissingCredentials);
        }

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(&password, &user.password)? {
            tracing::info!(user_id = %user.id, "login with wrong password");
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Store a reset token and email its raw form, appended to `reset_url_base`.
    ///
    /// The token is cleared again when the email cannot be sent.
    #[instrument(skip(self, reset_url_base))]
    pub async fn forgot_password(&self, email: Option<&str>, reset_url_base: &str) -> UserResult<()> {
        let mut user = match email {
            Some(email) => self.users.get_by_email(email).await?,
            None => None,
        }
        .ok_or(UserError::UnknownEmail)?;

        let (raw, hashed) = new_reset_token();
        user.password_reset_token = Some(hashed);
        user.password_reset_expires = Some(Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES));
        self.users.save(&user).await?;

        let reset_url = format!("{reset_url_base}/{raw}");
        if let Err(e) = self
            .notifications
            .send_password_reset(&user.email, &user.name, &reset_url)
            .await
        {
            user.password_reset_token = None;
            user.password_reset_expires = None;
            self.users.save(&user).await?;
            return Err(UserError::EmailDelivery(e));
        }

        tracing::info!(user_id = %user.id, "password reset token sent");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn reset_password(&self, raw_token: &str, input: ResetPasswordRequest) -> UserResult<User> {
        let mut user = self
            .users
            .get_by_reset_token(&hash_reset_token(raw_token))
            .await?
            .filter(|user| user.reset_token_valid_at(Utc::now()))
            .ok_or(UserError::InvalidResetToken)?;

        input.validate().map_err(|e| UserError::Resource(e.into()))?;
        let password = input.password.unwrap_or_default();

        user.set_password(&password)?;
        self.users.save(&user).await?;
        tracing::info!(user_id = %user.id, "password reset");
        Ok(user)
    }

    #[instrument(skip(self, input))]
    pub async fn update_password(&self, user_id: Uuid, input: UpdatePasswordRequest) -> UserResult<User> {
        let mut user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ResourceError::NotFound("user"))?;

        let current = input.password_current.as_deref().unwrap_or_default();
        if !verify_password(current, &user.password)? {
            return Err(UserError::WrongCurrentPassword);
        }

        input.validate().map_err(|e| UserError::Resource(e.into()))?;
        user.set_password(&input.password.unwrap_or_default())?;
        self.users.save(&user).await?;
        Ok(user)
    }

    /// Name, email and photo only; any password field is refused.
    #[instrument(skip(self, input))]
    pub async fn update_me(&self, user_id: Uuid, input: UpdateMeRequest) -> UserResult<User> {
        if input.touches_password() {
            return Err(UserError::PasswordUpdateNotAllowed);
        }

        Ok(self.handlers.update_one(user_id, input.into_update()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_me(&self, user_id: Uuid) -> UserResult<()> {
        self.users.deactivate(user_id).await?;
        tracing::info!(%user_id, "account deactivated");
        Ok(())
    }
}

impl FromRef<UserService> for ResourceHandlers<User> {
    fn from_ref(service: &UserService) -> Self {
        service.handlers.clone()
    }
}
