//! Session and authentication records.

use serde::{Deserialize, Serialize};

/// Role attached to an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    BloodManager,
}

/// The authenticated user, populated from a login or verify-token response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Login input. The role determines which backend the login is routed to:
/// `Admin` goes to the auth backend with the role in the payload, anything
/// else goes to the blood-manager login endpoint without a role field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Successful login response shared by both login endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}
