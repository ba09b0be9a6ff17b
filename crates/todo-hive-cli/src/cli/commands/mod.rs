//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod service;
pub mod shell;
pub mod todos;
pub mod token;

use std::env;
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use todo_hive_app::clipboard::TerminalClipboard;
use todo_hive_app::render::DEFAULT_WIDTH;
use todo_hive_app::state::AlertKind;
use todo_hive_app::{AppState, Runtime};
use todo_hive_core::api::{ApiClient, ClientOptions};
use todo_hive_core::config::Config;
use todo_hive_core::session::FileTokenStore;
use tracing::debug;

pub const NOT_LOGGED_IN: &str = "Not logged in. Run `todo-hive login` first.";

/// Settings resolved once per invocation.
pub struct Context {
    pub config: Config,
    pub base_url: String,
    pub store: FileTokenStore,
}

impl Context {
    /// Loads config and resolves the base URL (`override_url` wins).
    pub fn load(override_url: Option<&str>) -> Result<Self> {
        let config = Config::load().context("load config")?;
        let base_url = config.effective_base_url(override_url)?;
        debug!(%base_url, backend = ?config.backend, "resolved config");
        Ok(Self {
            config,
            base_url,
            store: FileTokenStore::default_location(),
        })
    }

    pub fn client(&self) -> Result<ApiClient> {
        let options = ClientOptions::new(self.base_url.clone())
            .with_timeout(self.config.timeout())
            .with_pinned_variant(self.config.backend.pinned());
        ApiClient::new(options, Arc::new(self.store.clone())).context("create API client")
    }

    /// Controller runtime plus state seeded from the stored session.
    pub fn controller(&self) -> Result<(Runtime, AppState)> {
        let runtime = Runtime::new(self.client()?, Box::new(TerminalClipboard));
        let state = runtime.initial_state().context("read session")?;
        Ok((runtime, state))
    }
}

/// Error built from the latest error alert, or `fallback` if there is none.
pub fn alert_error(state: &AppState, fallback: &str) -> anyhow::Error {
    match state.last_error() {
        Some(alert) => anyhow!("{}", alert.message),
        None => anyhow!("{fallback}"),
    }
}

/// Prints error alerts that did not fail the command.
pub fn print_warnings(state: &AppState) {
    for alert in state.alerts.iter().filter(|a| a.kind == AlertKind::Error) {
        eprintln!("warning: {}", alert.message);
    }
}

/// Output width from `COLUMNS`, falling back to 80.
pub fn output_width() -> usize {
    env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.trim().parse().ok())
        .filter(|&cols: &usize| cols >= 40)
        .unwrap_or(DEFAULT_WIDTH)
}
