//! Pure view functions.
//!
//! Functions here take `&AppState` (or parts of it) by immutable reference
//! and build a view-model. They never mutate state or return effects, and
//! rendering the same state twice yields the same output.

use std::cmp::Reverse;
use std::fmt::Write as _;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use todo_hive_core::api::{Todo, User};
use todo_hive_core::session::{BackendVariant, mask_token};
use todo_hive_core::validation::TODO_MAX_CHARS;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::state::{AppState, Loading, View};

/// Characters of the todo id shown before the ellipsis.
const SHORT_ID_CHARS: usize = 8;

/// Display format for timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Naive formats the backends emit (no offset).
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Default width for text output when the terminal width is unknown.
pub const DEFAULT_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub short_id: String,
    pub content: String,
    pub created: String,
}

/// Identity card for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCard {
    pub id: String,
    pub username: String,
    pub created: String,
    /// Masked bearer token.
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertLine {
    pub label: &'static str,
    pub message: String,
}

/// Everything a front-end needs to draw one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub view: View,
    pub variant: BackendVariant,
    pub alerts: Vec<AlertLine>,
    pub user: Option<UserCard>,
    /// `None` when the backend has no todo support.
    pub todos: Option<Vec<TodoRow>>,
    /// Characters in the todo draft, counted against `draft_limit`.
    pub draft_chars: usize,
    pub draft_limit: usize,
    pub loading: Loading,
}

/// Builds the view-model for the current state.
pub fn render(state: &AppState) -> Frame {
    let alerts = state
        .alerts
        .iter()
        .map(|alert| AlertLine {
            label: alert.kind.label(),
            message: alert.message.clone(),
        })
        .collect();

    let on_dashboard = state.view == View::Dashboard;
    let user = (on_dashboard && (state.current_user.is_some() || state.session.token.is_some()))
        .then(|| render_user_info(state.current_user.as_ref(), state.session.token.as_deref()));
    let todos = (on_dashboard && state.variant().supports_todos())
        .then(|| render_todos(&state.todos));

    Frame {
        view: state.view,
        variant: state.variant(),
        alerts,
        user,
        todos,
        draft_chars: state.todo_draft.chars().count(),
        draft_limit: TODO_MAX_CHARS,
        loading: state.loading,
    }
}

/// Rebuilds the todo rows, newest first.
///
/// Todos with unparseable timestamps sort last; ties keep their input order.
pub fn render_todos(todos: &[Todo]) -> Vec<TodoRow> {
    let mut sorted: Vec<&Todo> = todos.iter().collect();
    sorted.sort_by_key(|todo| Reverse(parse_timestamp(&todo.created_at)));

    sorted
        .into_iter()
        .map(|todo| TodoRow {
            short_id: short_id(&todo.id),
            content: todo.content.clone(),
            created: format_timestamp(&todo.created_at),
        })
        .collect()
}

/// Rebuilds the identity card. Missing fields render as `-`.
pub fn render_user_info(user: Option<&User>, token: Option<&str>) -> UserCard {
    let or_dash = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };

    UserCard {
        id: or_dash(user.map_or("", |u| u.id.as_str())),
        username: or_dash(user.map_or("", |u| u.username.as_str())),
        created: user
            .and_then(|u| u.created_at.as_deref())
            .map_or_else(|| "-".to_string(), format_timestamp),
        token: token.map_or_else(|| "-".to_string(), mask_token),
    }
}

/// Renders todo rows as a table no wider than `max_width`.
pub fn todos_table(rows: &[TodoRow], max_width: usize) -> String {
    if rows.is_empty() {
        return "No todos yet.".to_string();
    }

    // id and date columns plus borders take roughly 40 columns
    let content_width = max_width.saturating_sub(40).max(10);

    let mut table = Table::new();
    table.set_width(u16::try_from(max_width).unwrap_or(u16::MAX));
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Todo", "Created"]);
    for row in rows {
        table.add_row(vec![
            row.short_id.clone(),
            truncate_with_ellipsis(&row.content, content_width),
            row.created.clone(),
        ]);
    }
    table.to_string()
}

impl Frame {
    /// Plain-text rendering for line-based front-ends.
    pub fn to_text(&self, max_width: usize) -> String {
        let mut out = String::new();

        for alert in &self.alerts {
            let _ = writeln!(out, "[{}] {}", alert.label, alert.message);
        }

        match self.view {
            View::Login => {
                let _ = writeln!(out, "Sign in ({} backend)", self.variant);
            }
            View::Register => {
                let _ = writeln!(out, "Create an account ({} backend)", self.variant);
            }
            View::Dashboard => {
                if let Some(card) = &self.user {
                    let _ = writeln!(out, "User:     {}", card.username);
                    let _ = writeln!(out, "ID:       {}", card.id);
                    let _ = writeln!(out, "Created:  {}", card.created);
                    let _ = writeln!(out, "Token:    {}", card.token);
                }
                let _ = writeln!(out, "Backend:  {}", self.variant);
                if let Some(rows) = &self.todos {
                    let _ = writeln!(out, "Draft:    {}/{}", self.draft_chars, self.draft_limit);
                    let _ = writeln!(out, "{}", todos_table(rows, max_width));
                }
            }
        }

        out
    }
}

fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(SHORT_ID_CHARS).collect();
    format!("{prefix}...")
}

/// Parses RFC 3339 or naive timestamps; naive ones are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp for display.
///
/// Zoned timestamps are shown in local time; naive ones as written.
/// Anything unparseable is returned unchanged.
fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string();
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map_or_else(
            || raw.to_string(),
            |naive| naive.format(TIMESTAMP_FORMAT).to_string(),
        )
}

fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }
    let mut truncated = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width + 1 > max_width {
            break;
        }
        width += ch_width;
        truncated.push(ch);
    }
    truncated.push('…');
    truncated
}
