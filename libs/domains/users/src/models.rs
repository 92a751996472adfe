use chrono::{DateTime, Utc};
use mongodb::bson::{Document, doc};
use resource_handler::{Resource, ResourceError, ResourceResult, require};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::UserResult;
use crate::password::hash_password;

pub const DEFAULT_PHOTO: &str = "default.jpg";

/// User roles
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Role {
    #[default]
    User,
    Guide,
    LeadGuide,
    Admin,
}

/// User entity, stored in the `users` collection
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[validate(length(min = 1, message = "Please tell us your name!"))]
    pub name: String,
    /// Unique, stored lower-cased
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    pub photo: String,
    pub role: Role,
    /// Argon2 hash, never rendered
    #[schema(write_only)]
    pub password: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    /// SHA-256 of the emailed reset token
    #[schema(write_only)]
    pub password_reset_token: Option<String>,
    #[schema(write_only)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    /// Cleared by `DELETE /deleteMe`; inactive users are invisible
    #[serde(default = "active")]
    #[schema(write_only)]
    pub active: bool,
}

fn active() -> bool {
    true
}

impl User {
    /// Replace the password and clear any pending reset.
    ///
    /// `passwordChangedAt` is backdated by a second so a token signed right
    /// after the change is still accepted.
    pub fn set_password(&mut self, password: &str) -> UserResult<()> {
        self.password = hash_password(password)?;
        self.password_changed_at = Some(Utc::now() - chrono::Duration::seconds(1));
        self.password_reset_token = None;
        self.password_reset_expires = None;
        Ok(())
    }

    /// True while the stored reset token has not expired.
    pub fn reset_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.password_reset_expires.is_some_and(|expires| expires > now)
    }
}

/// Account creation by an administrator, and the body behind `POST /signup`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "confirm_create"))]
pub struct CreateUser {
    #[validate(required(message = "Please tell us your name!"))]
    pub name: Option<String>,
    #[validate(
        required(message = "Please provide your email"),
        email(message = "Please provide a valid email")
    )]
    pub email: Option<String>,
    pub photo: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    #[validate(
        required(message = "Please provide a password"),
        length(min = 8, message = "A password must have at least 8 characters")
    )]
    pub password: Option<String>,
    #[validate(required(message = "Please confirm your password"))]
    pub password_confirm: Option<String>,
}

/// Self-service signup. Any role in the body is ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

impl From<SignupRequest> for CreateUser {
    fn from(input: SignupRequest) -> Self {
        CreateUser {
            name: input.name,
            email: input.email,
            photo: input.photo,
            role: None,
            password: input.password,
            password_confirm: input.password_confirm,
        }
    }
}

/// Administrative update. Passwords are never changed through this DTO.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub photo: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
}

/// Body of `PATCH /updateMe`. Password fields are only captured so they can
/// be rejected.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    #[schema(value_type = Option<String>)]
    pub password: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub password_confirm: Option<Value>,
}

impl UpdateMeRequest {
    pub fn touches_password(&self) -> bool {
        self.password.is_some() || self.password_confirm.is_some()
    }

    /// The allowed fields as an update.
    pub fn into_update(self) -> UpdateUser {
        UpdateUser {
            name: self.name,
            email: self.email,
            photo: self.photo,
            role: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "confirm_reset"))]
pub struct ResetPasswordRequest {
    #[validate(
        required(message = "Please provide a password"),
        length(min = 8, message = "A password must have at least 8 characters")
    )]
    pub password: Option<String>,
    #[validate(required(message = "Please confirm your password"))]
    pub password_confirm: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "confirm_update"))]
pub struct UpdatePasswordRequest {
    #[validate(required(message = "Please provide your current password"))]
    pub password_current: Option<String>,
    #[validate(
        required(message = "Please provide a password"),
        length(min = 8, message = "A password must have at least 8 characters")
    )]
    pub password: Option<String>,
    #[validate(required(message = "Please confirm your password"))]
    pub password_confirm: Option<String>,
}

fn passwords_match(password: Option<&str>, confirm: Option<&str>) -> Result<(), ValidationError> {
    match (password, confirm) {
        (Some(password), Some(confirm)) if password != confirm => {
            Err(ValidationError::new("password_confirm").with_message("Passwords are not the same!".into()))
        }
        _ => Ok(()),
    }
}

fn confirm_create(input: &CreateUser) -> Result<(), ValidationError> {
    passwords_match(input.password.as_deref(), input.password_confirm.as_deref())
}

fn confirm_reset(input: &ResetPasswordRequest) -> Result<(), ValidationError> {
    passwords_match(input.password.as_deref(), input.password_confirm.as_deref())
}

fn confirm_update(input: &UpdatePasswordRequest) -> Result<(), ValidationError> {
    passwords_match(input.password.as_deref(), input.password_confirm.as_deref())
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    match Role::from_str(role) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("role")
            .with_message("Role is either: user, guide, lead-guide, admin".into())),
    }
}

impl Resource for User {
    const COLLECTION: &'static str = "users";
    const SINGULAR: &'static str = "user";
    const PLURAL: &'static str = "users";

    const UNIQUE_INDEXES: &'static [&'static [&'static str]] = &[&["email"]];
    const HIDDEN_FIELDS: &'static [&'static str] = &[
        "password",
        "passwordResetToken",
        "passwordResetExpires",
        "active",
    ];

    type Create = CreateUser;
    type Update = UpdateUser;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: CreateUser) -> ResourceResult<Self> {
        let password = require("password", input.password)?;
        let role = match input.role {
            Some(role) => Role::from_str(&role)
                .map_err(|_| ResourceError::violation("role", "Role is either: user, guide, lead-guide, admin"))?,
            None => Role::default(),
        };

        Ok(User {
            id: Uuid::now_v7(),
            name: require("name", input.name)?.trim().to_string(),
            email: require("email", input.email)?.trim().to_lowercase(),
            photo: input.photo.unwrap_or_else(|| DEFAULT_PHOTO.to_string()),
            role,
            password: hash_password(&password).map_err(|e| ResourceError::Internal(e.to_string()))?,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            active: true,
        })
    }

    fn apply_update(&mut self, patch: UpdateUser) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = email.trim().to_lowercase();
        }
        if let Some(photo) = patch.photo {
            self.photo = photo;
        }
        if let Some(role) = patch.role.and_then(|r| Role::from_str(&r).ok()) {
            self.role = role;
        }
    }

    fn base_filter() -> Document {
        doc! { "active": { "$ne": false } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::verify_password;

    fn create_input() -> CreateUser {
        CreateUser {
            name: Some(" Leo Gillespie ".into()),
            email: Some("Leo@Example.COM".into()),
            photo: None,
            role: None,
            password: Some("pass1234".into()),
            password_confirm: Some("pass1234".into()),
        }
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::LeadGuide.to_string(), "lead-guide");
        assert_eq!(Role::from_str("lead-guide").unwrap(), Role::LeadGuide);
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
        assert!(Role::from_str("moderator").is_err());
    }

    #[test]
    fn test_from_create_normalizes_and_hashes() {
        let user = User::from_create(create_input()).unwrap();

        assert_eq!(user.name, "Leo Gillespie");
        assert_eq!(user.email, "leo@example.com");
        assert_eq!(user.photo, DEFAULT_PHOTO);
        assert_eq!(user.role, Role::User);
        assert!(user.active);
        assert_ne!(user.password, "pass1234");
        assert!(verify_password("pass1234", &user.password).unwrap());
    }

    #[test]
    fn test_password_confirmation_must_match() {
        let mut input = create_input();
        input.password_confirm = Some("pass4321".into());

        let errors = input.validate().unwrap_err().to_string();
        assert!(errors.contains("Passwords are not the same!"));
    }

    #[test]
    fn test_password_changes_check_confirmation() {
        let reset = ResetPasswordRequest {
            password: Some("newpass123".into()),
            password_confirm: Some("newpass124".into()),
        };
        let update = UpdatePasswordRequest {
            password_current: Some("pass1234".into()),
            password: Some("newpass123".into()),
            password_confirm: Some("newpass123".into()),
        };
        let unconfirmed = UpdatePasswordRequest {
            password_confirm: None,
            ..update.clone()
        };

        assert!(reset.validate().unwrap_err().to_string().contains("Passwords are not the same!"));
        assert!(update.validate().is_ok());
        let errors = unconfirmed.validate().unwrap_err().to_string();
        assert!(errors.contains("Please confirm your password"));
        assert!(!errors.contains("Passwords are not the same!"));
    }

    #[test]
    fn test_short_password_and_bad_email() {
        let mut input = create_input();
        input.password = Some("short".into());
        input.password_confirm = Some("short".into());
        input.email = Some("not-an-email".into());

        let errors = input.validate().unwrap_err().to_string();
        assert!(errors.contains("at least 8 characters"));
        assert!(errors.contains("Please provide a valid email"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let mut input = create_input();
        input.role = Some("superuser".into());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_signup_drops_role() {
        let signup: SignupRequest = serde_json::from_value(serde_json::json!({
            "name": "Eve",
            "email": "eve@example.com",
            "password": "pass1234",
            "passwordConfirm": "pass1234",
            "role": "admin"
        }))
        .unwrap();

        let create = CreateUser::from(signup);
        assert!(create.role.is_none());
    }

    #[test]
    fn test_update_me_detects_password_fields() {
        let body: UpdateMeRequest =
            serde_json::from_value(serde_json::json!({"name": "Eve", "password": "x"})).unwrap();
        assert!(body.touches_password());

        let body: UpdateMeRequest =
            serde_json::from_value(serde_json::json!({"name": "Eve", "role": "admin"})).unwrap();
        assert!(!body.touches_password());
        assert!(body.into_update().role.is_none());
    }

    #[test]
    fn test_set_password_clears_reset_and_backdates() {
        let mut user = User::from_create(create_input()).unwrap();
        user.password_reset_token = Some("hash".into());
        user.password_reset_expires = Some(Utc::now());

        let before = Utc::now();
        user.set_password("newpass123").unwrap();

        assert!(verify_password("newpass123", &user.password).unwrap());
        assert!(user.password_reset_token.is_none());
        assert!(user.password_reset_expires.is_none());
        assert!(user.password_changed_at.unwrap() < before);
    }

    #[test]
    fn test_reset_token_expiry() {
        let mut user = User::from_create(create_input()).unwrap();
        let now = Utc::now();
        assert!(!user.reset_token_valid_at(now));

        user.password_reset_expires = Some(now + chrono::Duration::minutes(10));
        assert!(user.reset_token_valid_at(now));
        assert!(!user.reset_token_valid_at(now + chrono::Duration::minutes(11)));
    }
}
