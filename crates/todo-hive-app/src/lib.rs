//! Application controller for todo-hive front-ends.
//!
//! The controller follows an update/effect split:
//! - `update(state, event)` is the only place state changes
//! - effects describe I/O for the runtime to perform
//! - results come back as events
//! - `render` turns state into a view-model

pub mod clipboard;
pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod update;

pub use effects::UiEffect;
pub use events::{EffectError, UiEvent};
pub use runtime::Runtime;
pub use state::{AppState, View};
pub use update::update;
