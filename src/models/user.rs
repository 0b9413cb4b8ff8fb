use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    // Digits plus common separators; length bounds keep out garbage.
    pub static ref PHONE_REGEX: regex::Regex =
        regex::Regex::new(r"^[0-9+\-\s().]{7,20}$").unwrap();
}

/// Role attached to an account.
/// Corresponds to the `account_role` SQL enum.
///
/// A closed enum rather than a free-form string keeps every authorization
/// decision in `policy` auditable against exactly two cases.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// An account as stored in the `accounts` table.
///
/// The password hash is carried for verification but never serialized: every
/// response that includes an account goes through this type, so the hash
/// cannot leak by accident.
#[derive(Debug, Serialize, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for the admin-only account creation endpoint.
/// Unlike self-registration, the requested role is honored as-is.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub role: Option<Role>,
}

/// Partial profile update. Only supplied fields change.
/// There is deliberately no role or password field here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDetailsRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub phone: Option<String>,
}
