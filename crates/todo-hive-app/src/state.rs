//! Application state.
//!
//! ```text
//! AppState
//! ├── view: View              (login / register / dashboard)
//! ├── session: Session        (token + negotiated backend variant)
//! ├── current_user: Option<User>
//! ├── todos: Vec<Todo>        (replaced wholesale on every fetch)
//! ├── todo_draft: String      (last submitted todo text, kept until saved)
//! ├── alerts: Vec<Alert>      (transient messages)
//! └── loading: Loading        (in-flight guards)
//! ```
//!
//! The state is an explicit value passed to `update` and `render`; there is no
//! ambient instance.

use std::time::Duration;

use todo_hive_core::api::{Todo, User};
use todo_hive_core::session::{BackendVariant, Session};

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Register,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
    Info,
}

impl AlertKind {
    /// Delay before the alert is dismissed automatically.
    pub fn dismiss_after(self) -> Duration {
        match self {
            AlertKind::Success => Duration::from_secs(3),
            AlertKind::Error | AlertKind::Info => Duration::from_secs(5),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Error => "error",
            AlertKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    pub kind: AlertKind,
    pub message: String,
}

/// In-flight flags. An action whose flag is set ignores further submits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loading {
    pub login: bool,
    pub register: bool,
    pub add_todo: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    pub session: Session,
    pub current_user: Option<User>,
    pub todos: Vec<Todo>,
    pub todo_draft: String,
    pub alerts: Vec<Alert>,
    pub loading: Loading,
    next_alert_id: u64,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            view: View::Login,
            session,
            current_user: None,
            todos: Vec::new(),
            todo_draft: String::new(),
            alerts: Vec::new(),
            loading: Loading::default(),
            next_alert_id: 1,
        }
    }

    pub fn variant(&self) -> BackendVariant {
        self.session.variant.variant()
    }

    /// Adds an alert and returns its id.
    pub fn push_alert(&mut self, kind: AlertKind, message: impl Into<String>) -> u64 {
        let id = self.next_alert_id;
        self.next_alert_id += 1;
        self.alerts.push(Alert {
            id,
            kind,
            message: message.into(),
        });
        id
    }

    pub fn dismiss_alert(&mut self, id: u64) {
        self.alerts.retain(|alert| alert.id != id);
    }

    pub fn clear_alerts(&mut self) {
        self.alerts.clear();
    }

    pub fn last_error(&self) -> Option<&Alert> {
        self.alerts
            .iter()
            .rev()
            .find(|alert| alert.kind == AlertKind::Error)
    }

    /// Drops everything tied to the signed-in account.
    pub fn forget_account(&mut self) {
        self.session.token = None;
        self.current_user = None;
        self.todos.clear();
        self.todo_draft.clear();
        self.loading = Loading::default();
    }
}
