//! Effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O only; the reducer never calls the API itself.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Check the stored token against the backend.
    VerifySession,

    Login {
        username: String,
        password: String,
    },

    Register {
        username: String,
        password: String,
    },

    /// Fetch the signed-in user (`/api/me`).
    LoadUser,

    /// Fetch the todo list; the result replaces the in-memory list.
    LoadTodos,

    CreateTodo {
        content: String,
    },

    /// Forget the stored token.
    ClearSession,

    CopyToClipboard {
        text: String,
    },

    /// Dismiss an alert after a delay. Cosmetic only.
    ScheduleDismiss {
        id: u64,
        after: Duration,
    },
}

impl UiEffect {
    /// Short name for logs. Never includes credentials or tokens.
    pub fn name(&self) -> &'static str {
        match self {
            UiEffect::VerifySession => "verify_session",
            UiEffect::Login { .. } => "login",
            UiEffect::Register { .. } => "register",
            UiEffect::LoadUser => "load_user",
            UiEffect::LoadTodos => "load_todos",
            UiEffect::CreateTodo { .. } => "create_todo",
            UiEffect::ClearSession => "clear_session",
            UiEffect::CopyToClipboard { .. } => "copy_to_clipboard",
            UiEffect::ScheduleDismiss { .. } => "schedule_dismiss",
        }
    }
}
