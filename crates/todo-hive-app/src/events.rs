//! Events fed into the reducer.
//!
//! User actions come from the front-end; result events come from the runtime
//! after it executes an effect. Errors travel as an `EffectError`: the
//! display message plus whether the backend rejected the session.

use std::fmt;

use todo_hive_core::api::{LoginOutcome, RegisterOutcome, SessionCheck, Todo, User};
use todo_hive_core::error::ApiError;
use todo_hive_core::session::Session;

/// Failure reported by an effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectError {
    pub message: String,
    /// The backend answered 401/403; the stored token is no longer usable.
    pub session: bool,
}

impl EffectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session: false,
        }
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session: true,
        }
    }
}

impl From<&ApiError> for EffectError {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.to_string(),
            session: err.is_session_error(),
        }
    }
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// First event after start-up.
    Startup,

    // User actions
    ShowLogin,
    ShowRegister,
    SubmitLogin {
        username: String,
        password: String,
    },
    SubmitRegister {
        username: String,
        password: String,
        confirm: String,
    },
    /// Draft text changed; drives the character counter.
    EditDraft {
        content: String,
    },
    SubmitTodo {
        content: String,
    },
    RefreshTodos,
    Logout,
    CopyToken,
    DismissAlert {
        id: u64,
    },

    // Results
    /// Fresh session snapshot, sent before the result of any session-changing effect.
    SessionSynced(Session),
    SessionVerified(Result<SessionCheck, EffectError>),
    LoginFinished(Result<LoginOutcome, EffectError>),
    RegisterFinished(Result<RegisterOutcome, EffectError>),
    UserLoaded(Result<Option<User>, EffectError>),
    TodosLoaded(Result<Vec<Todo>, EffectError>),
    TodoCreated(Result<Todo, EffectError>),
    TokenCopied(Result<(), EffectError>),
}
