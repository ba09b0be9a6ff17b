//! Controller runtime: executes effects, feeds results back into `update`.
//!
//! All side effects happen here. The reducer stays pure and produces
//! effects; this module runs them against the API client and clipboard and
//! turns the outcomes into events. A dispatch runs until no effects remain.

use std::collections::VecDeque;
use std::time::Instant;

use todo_hive_core::api::ApiClient;
use todo_hive_core::error::ApiError;
use tracing::{debug, warn};

use crate::clipboard::Clipboard;
use crate::effects::UiEffect;
use crate::events::{EffectError, UiEvent};
use crate::state::AppState;
use crate::update;

pub struct Runtime {
    client: ApiClient,
    clipboard: Box<dyn Clipboard>,
    /// Pending alert dismissals as (deadline, alert id).
    dismissals: Vec<(Instant, u64)>,
}

impl Runtime {
    pub fn new(client: ApiClient, clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            client,
            clipboard,
            dismissals: Vec::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// State seeded from the stored session.
    ///
    /// # Errors
    /// Returns an error if the token store cannot be read.
    pub fn initial_state(&self) -> Result<AppState, ApiError> {
        Ok(AppState::new(self.client.session()?))
    }

    /// Feeds `event` to the reducer and runs effects until none remain.
    pub async fn dispatch(&mut self, state: &mut AppState, event: UiEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in update(state, event) {
                queue.extend(self.execute(effect).await);
            }
        }
    }

    /// Removes alerts whose dismissal deadline has passed.
    ///
    /// Returns whether anything was dismissed.
    pub fn dismiss_expired(&mut self, state: &mut AppState, now: Instant) -> bool {
        let expired = self.expired_alerts(now);
        for &id in &expired {
            // DismissAlert never produces effects.
            let _ = update(state, UiEvent::DismissAlert { id });
        }
        !expired.is_empty()
    }

    /// Drains dismissals due at `now`.
    pub fn expired_alerts(&mut self, now: Instant) -> Vec<u64> {
        let mut expired = Vec::new();
        self.dismissals.retain(|&(deadline, id)| {
            if deadline <= now {
                expired.push(id);
                false
            } else {
                true
            }
        });
        expired
    }

    async fn execute(&mut self, effect: UiEffect) -> Vec<UiEvent> {
        debug!(effect = effect.name(), "executing effect");
        match effect {
            UiEffect::VerifySession => {
                let result = self.client.verify_session().await.map_err(describe);
                self.with_session(UiEvent::SessionVerified(result))
            }
            UiEffect::Login { username, password } => {
                let result = self
                    .client
                    .login(&username, &password)
                    .await
                    .map_err(describe);
                self.with_session(UiEvent::LoginFinished(result))
            }
            UiEffect::Register { username, password } => {
                let result = self
                    .client
                    .register(&username, &password)
                    .await
                    .map_err(describe);
                self.with_session(UiEvent::RegisterFinished(result))
            }
            UiEffect::LoadUser => {
                let result = self.client.current_user().await.map_err(describe);
                vec![UiEvent::UserLoaded(result)]
            }
            UiEffect::LoadTodos => {
                let result = self.client.list_todos().await.map_err(describe);
                vec![UiEvent::TodosLoaded(result)]
            }
            UiEffect::CreateTodo { content } => {
                let result = self.client.create_todo(&content).await.map_err(describe);
                vec![UiEvent::TodoCreated(result)]
            }
            UiEffect::ClearSession => {
                if let Err(err) = self.client.logout() {
                    warn!(%err, "failed to clear stored token");
                }
                self.session_synced().into_iter().collect()
            }
            UiEffect::CopyToClipboard { text } => {
                let result = self
                    .clipboard
                    .copy(&text)
                    .map_err(|err| EffectError::new(err.to_string()));
                vec![UiEvent::TokenCopied(result)]
            }
            UiEffect::ScheduleDismiss { id, after } => {
                self.dismissals.push((Instant::now() + after, id));
                vec![]
            }
        }
    }

    /// Prepends a fresh session snapshot to `result`.
    fn with_session(&self, result: UiEvent) -> Vec<UiEvent> {
        let mut events: Vec<UiEvent> = self.session_synced().into_iter().collect();
        events.push(result);
        events
    }

    fn session_synced(&self) -> Option<UiEvent> {
        match self.client.session() {
            Ok(session) => Some(UiEvent::SessionSynced(session)),
            Err(err) => {
                warn!(%err, "failed to read session");
                None
            }
        }
    }
}

fn describe(err: ApiError) -> EffectError {
    debug!(error = ?err, "effect failed");
    EffectError::from(&err)
}
