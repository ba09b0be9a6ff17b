//! Core todo-hive library (session storage, API client, config, validation).

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod validation;
