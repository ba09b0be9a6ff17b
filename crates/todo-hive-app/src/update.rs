//! Reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(state, event)`
//! and executes the returned effects. Input is validated here, before any
//! effect that would reach the network is emitted.

use todo_hive_core::api::{LoginOutcome, RegisterOutcome, SessionCheck, Todo, User};
use todo_hive_core::session::BackendVariant;
use todo_hive_core::validation::{validate_credentials, validate_registration, validate_todo_content};

use crate::effects::UiEffect;
use crate::events::{EffectError, UiEvent};
use crate::state::{AlertKind, AppState, View};

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(state: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Startup => handle_startup(state),
        UiEvent::ShowLogin => switch_view(state, View::Login),
        UiEvent::ShowRegister => switch_view(state, View::Register),
        UiEvent::SubmitLogin { username, password } => submit_login(state, &username, &password),
        UiEvent::SubmitRegister {
            username,
            password,
            confirm,
        } => submit_register(state, &username, &password, &confirm),
        UiEvent::EditDraft { content } => {
            if state.view == View::Dashboard {
                state.todo_draft = content;
            }
            vec![]
        }
        UiEvent::SubmitTodo { content } => submit_todo(state, &content),
        UiEvent::RefreshTodos => {
            if state.view == View::Dashboard && state.variant().supports_todos() {
                vec![UiEffect::LoadTodos]
            } else {
                vec![]
            }
        }
        UiEvent::Logout => handle_logout(state),
        UiEvent::CopyToken => match state.session.token.clone() {
            Some(text) => vec![UiEffect::CopyToClipboard { text }],
            None => vec![alert(state, AlertKind::Error, "No token to copy")],
        },
        UiEvent::DismissAlert { id } => {
            state.dismiss_alert(id);
            vec![]
        }
        UiEvent::SessionSynced(session) => {
            state.session = session;
            vec![]
        }
        UiEvent::SessionVerified(result) => handle_session_verified(state, result),
        UiEvent::LoginFinished(result) => handle_login_finished(state, result),
        UiEvent::RegisterFinished(result) => handle_register_finished(state, result),
        UiEvent::UserLoaded(result) => handle_user_loaded(state, result),
        UiEvent::TodosLoaded(result) => handle_todos_loaded(state, result),
        UiEvent::TodoCreated(result) => handle_todo_created(state, result),
        UiEvent::TokenCopied(result) => match result {
            Ok(()) => vec![alert(state, AlertKind::Success, "Token copied to clipboard")],
            Err(err) => vec![alert(state, AlertKind::Error, err.message)],
        },
    }
}

/// Pushes an alert and schedules its dismissal.
fn alert(state: &mut AppState, kind: AlertKind, message: impl Into<String>) -> UiEffect {
    let id = state.push_alert(kind, message);
    UiEffect::ScheduleDismiss {
        id,
        after: kind.dismiss_after(),
    }
}

fn handle_startup(state: &mut AppState) -> Vec<UiEffect> {
    if state.session.is_authenticated() {
        vec![UiEffect::VerifySession]
    } else {
        state.view = View::Login;
        vec![]
    }
}

fn switch_view(state: &mut AppState, view: View) -> Vec<UiEffect> {
    // Leaving the dashboard goes through logout.
    if state.view == View::Dashboard {
        return vec![];
    }
    state.view = view;
    state.clear_alerts();
    vec![]
}

/// Shows the dashboard and requests whatever the backend can provide.
fn enter_dashboard(state: &mut AppState) -> Vec<UiEffect> {
    state.view = View::Dashboard;
    match state.variant() {
        BackendVariant::A => vec![UiEffect::LoadTodos],
        BackendVariant::B => vec![UiEffect::LoadUser],
    }
}

fn submit_login(state: &mut AppState, username: &str, password: &str) -> Vec<UiEffect> {
    if state.view == View::Dashboard || state.loading.login {
        return vec![];
    }
    match validate_credentials(username, password) {
        Ok(credentials) => {
            state.loading.login = true;
            vec![UiEffect::Login {
                username: credentials.username,
                password: credentials.password,
            }]
        }
        Err(err) => vec![alert(state, AlertKind::Error, err.to_string())],
    }
}

fn submit_register(
    state: &mut AppState,
    username: &str,
    password: &str,
    confirm: &str,
) -> Vec<UiEffect> {
    if state.view == View::Dashboard || state.loading.register {
        return vec![];
    }
    match validate_registration(username, password, confirm) {
        Ok(credentials) => {
            state.loading.register = true;
            vec![UiEffect::Register {
                username: credentials.username,
                password: credentials.password,
            }]
        }
        Err(err) => vec![alert(state, AlertKind::Error, err.to_string())],
    }
}

fn submit_todo(state: &mut AppState, content: &str) -> Vec<UiEffect> {
    if state.view != View::Dashboard || state.loading.add_todo {
        return vec![];
    }
    state.todo_draft = content.to_string();
    match validate_todo_content(content) {
        Ok(content) => {
            state.loading.add_todo = true;
            vec![UiEffect::CreateTodo { content }]
        }
        Err(err) => vec![alert(state, AlertKind::Error, err.to_string())],
    }
}

/// Drops the rejected session and returns to the login view.
fn end_session(state: &mut AppState, message: String) -> Vec<UiEffect> {
    state.forget_account();
    state.view = View::Login;
    vec![
        UiEffect::ClearSession,
        alert(state, AlertKind::Error, message),
    ]
}

fn handle_logout(state: &mut AppState) -> Vec<UiEffect> {
    state.forget_account();
    state.view = View::Login;
    state.clear_alerts();
    vec![
        UiEffect::ClearSession,
        alert(state, AlertKind::Info, "Logged out"),
    ]
}

fn handle_session_verified(
    state: &mut AppState,
    result: Result<SessionCheck, EffectError>,
) -> Vec<UiEffect> {
    match result {
        Ok(SessionCheck::Anonymous) => {
            state.view = View::Login;
            vec![]
        }
        Ok(SessionCheck::Valid { user, todos }) => {
            state.view = View::Dashboard;
            let mut effects = Vec::new();
            match user {
                Some(user) => state.current_user = Some(user),
                None if state.variant() == BackendVariant::B => effects.push(UiEffect::LoadUser),
                None => {}
            }
            match todos {
                Some(todos) => state.todos = todos,
                None if state.variant() == BackendVariant::A => effects.push(UiEffect::LoadTodos),
                None => {}
            }
            effects
        }
        Ok(SessionCheck::Rejected { reason }) => {
            state.forget_account();
            state.view = View::Login;
            vec![alert(
                state,
                AlertKind::Error,
                format!("Session expired ({reason}). Please log in again."),
            )]
        }
        Err(err) => {
            state.view = View::Login;
            vec![alert(
                state,
                AlertKind::Error,
                format!("Could not verify session: {err}"),
            )]
        }
    }
}

fn handle_login_finished(
    state: &mut AppState,
    result: Result<LoginOutcome, EffectError>,
) -> Vec<UiEffect> {
    state.loading.login = false;
    match result {
        Ok(outcome) => {
            state.current_user = outcome.user().cloned();
            let mut effects = vec![alert(state, AlertKind::Success, "Logged in successfully")];
            effects.extend(enter_dashboard(state));
            effects
        }
        Err(err) => vec![alert(state, AlertKind::Error, err.message)],
    }
}

fn handle_register_finished(
    state: &mut AppState,
    result: Result<RegisterOutcome, EffectError>,
) -> Vec<UiEffect> {
    state.loading.register = false;
    match result {
        Ok(RegisterOutcome::Acknowledged { message }) => {
            state.view = View::Login;
            state.clear_alerts();
            vec![alert(
                state,
                AlertKind::Success,
                format!("{message}. Please log in."),
            )]
        }
        Ok(outcome @ RegisterOutcome::Issued { .. }) => {
            state.current_user = outcome.user().cloned();
            let mut effects = vec![alert(state, AlertKind::Success, "Registered successfully")];
            effects.extend(enter_dashboard(state));
            effects
        }
        Err(err) => vec![alert(state, AlertKind::Error, err.message)],
    }
}

fn handle_user_loaded(state: &mut AppState, result: Result<Option<User>, EffectError>) -> Vec<UiEffect> {
    if state.view != View::Dashboard {
        return vec![];
    }
    match result {
        Ok(Some(user)) => {
            state.current_user = Some(user);
            vec![]
        }
        // Backend has no profile endpoint; keep what login returned.
        Ok(None) => vec![],
        Err(err) => end_session(state, format!("Failed to load user info: {err}")),
    }
}

fn handle_todos_loaded(state: &mut AppState, result: Result<Vec<Todo>, EffectError>) -> Vec<UiEffect> {
    match result {
        Ok(todos) => {
            if state.view == View::Dashboard {
                state.todos = todos;
            }
            vec![]
        }
        Err(err) if err.session => end_session(state, format!("Failed to load todos: {err}")),
        Err(err) => vec![alert(
            state,
            AlertKind::Error,
            format!("Failed to load todos: {err}"),
        )],
    }
}

fn handle_todo_created(state: &mut AppState, result: Result<Todo, EffectError>) -> Vec<UiEffect> {
    state.loading.add_todo = false;
    match result {
        Ok(_) => {
            state.todo_draft.clear();
            vec![
                alert(state, AlertKind::Success, "Todo added"),
                UiEffect::LoadTodos,
            ]
        }
        Err(err) if err.session => end_session(state, format!("Failed to add todo: {err}")),
        Err(err) => vec![alert(state, AlertKind::Error, err.message)],
    }
}
