//! Input validation performed before any request is sent.

use std::ops::RangeInclusive;

use thiserror::Error;

/// Allowed username length, in characters, after trimming.
pub const USERNAME_LEN: RangeInclusive<usize> = 3..=50;
/// Allowed password length, in characters.
pub const PASSWORD_LEN: RangeInclusive<usize> = 6..=100;
/// Maximum todo content length, in characters, after trimming.
pub const TODO_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a username and password")]
    MissingCredentials,
    #[error("Username must be between 3 and 50 characters")]
    UsernameLength,
    #[error("Password must be between 6 and 100 characters")]
    PasswordLength,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please enter todo content")]
    EmptyTodo,
    #[error("Todo content cannot exceed 1000 characters")]
    TodoTooLong,
}

/// Credentials that passed validation. The username is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Validates login credentials.
///
/// # Errors
/// Returns the first rule the input breaks.
pub fn validate_credentials(username: &str, password: &str) -> Result<Credentials, ValidationError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ValidationError::UsernameLength);
    }
    if !PASSWORD_LEN.contains(&password.chars().count()) {
        return Err(ValidationError::PasswordLength);
    }
    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Validates registration input, including the password confirmation.
///
/// # Errors
/// Returns the first rule the input breaks.
pub fn validate_registration(
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<Credentials, ValidationError> {
    let credentials = validate_credentials(username, password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(credentials)
}

/// Validates todo content and returns it trimmed.
///
/// # Errors
/// Returns an error for empty or oversized content.
pub fn validate_todo_content(content: &str) -> Result<String, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyTodo);
    }
    if content.chars().count() > TODO_MAX_CHARS {
        return Err(ValidationError::TodoTooLong);
    }
    Ok(content.to_string())
}
