pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Role;

pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

/// Payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload for a self-registration request.
///
/// A requested role is accepted in the payload but silently coerced to `user`
/// by the register handler; self-registration can never grant admin.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(regex(
        path = "crate::models::user::PHONE_REGEX",
        message = "Invalid phone number"
    ))]
    pub phone: Option<String>,
    pub role: Option<Role>,
}

/// Payload for the authenticated password-change endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

/// Payload for the admin-only password reset endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

/// Public profile fields returned after registration, with the session token.
/// The password hash is never part of this structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredAccount {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub token: String,
}
