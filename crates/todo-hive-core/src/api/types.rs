//! Wire types for the todo hive backends.
//!
//! Response shapes differ per backend variant; the outcome enums below make
//! the shape explicit so callers never guess at optional fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::session::BackendVariant;

#[derive(Debug, Serialize)]
pub(crate) struct CredentialsBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TodoBody<'a> {
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenBody<'a> {
    pub token: &'a str,
}

/// Account record (variant B only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Todo item (variant A only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub content: String,
    pub created_at: String,
    #[serde(rename = "user_id", alias = "owner_id", default)]
    pub owner_id: String,
}

/// Result of `POST /api/register`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RegisterOutcome {
    /// `{token, user}`: the account is created and signed in.
    Issued {
        token: String,
        #[serde(default)]
        user: Option<User>,
    },
    /// `{message}`: the account is created; a separate login is needed.
    Acknowledged { message: String },
}

impl RegisterOutcome {
    /// Variant implied by the response shape.
    pub fn variant(&self) -> BackendVariant {
        match self {
            RegisterOutcome::Issued { .. } => BackendVariant::B,
            RegisterOutcome::Acknowledged { .. } => BackendVariant::A,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            RegisterOutcome::Issued { token, .. } => Some(token),
            RegisterOutcome::Acknowledged { .. } => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            RegisterOutcome::Issued { user, .. } => user.as_ref(),
            RegisterOutcome::Acknowledged { .. } => None,
        }
    }
}

/// Result of `POST /api/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LoginOutcome {
    /// `{token, user}`
    WithUser { token: String, user: User },
    /// `{token}`
    TokenOnly { token: String },
}

impl LoginOutcome {
    /// Variant implied by the response shape.
    pub fn variant(&self) -> BackendVariant {
        match self {
            LoginOutcome::WithUser { .. } => BackendVariant::B,
            LoginOutcome::TokenOnly { .. } => BackendVariant::A,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            LoginOutcome::WithUser { token, .. } | LoginOutcome::TokenOnly { token } => token,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            LoginOutcome::WithUser { user, .. } => Some(user),
            LoginOutcome::TokenOnly { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TodoList {
    #[serde(default)]
    pub todos: Vec<Todo>,
}

/// Liveness payload from `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Service description from `GET /` (variant B).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

/// Identity embedded in a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    #[serde(default)]
    pub user_id: String,
    pub username: String,
}

/// Result of `POST /api/verify-token` (variant B).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TokenUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of checking the stored token against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    /// No token stored.
    Anonymous,
    /// The backend accepted the token. Variant B yields the user, variant A the todos.
    Valid {
        user: Option<User>,
        todos: Option<Vec<Todo>>,
    },
    /// The backend refused the token; it has been cleared.
    Rejected { reason: String },
}
