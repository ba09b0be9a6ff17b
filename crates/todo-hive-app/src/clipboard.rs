//! Clipboard transports for copying the session token.
//!
//! The terminal clipboard (OSC 52) is tried first when stdout is a terminal,
//! then the system clipboard via `arboard`.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("OSC 52 clipboard failed: {0}")]
    Osc52(String),
    #[error("System clipboard failed: {0}")]
    System(String),
}

/// Destination for copied text.
pub trait Clipboard: Send + Sync {
    /// # Errors
    /// Returns an error if no transport accepted the text.
    fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

/// OSC 52 with a system clipboard fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalClipboard;

impl Clipboard for TerminalClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        if io::stdout().is_terminal() && copy_osc52(text).is_ok() {
            return Ok(());
        }
        copy_system(text)
    }
}

fn copy_osc52(text: &str) -> Result<(), ClipboardError> {
    let encoded = STANDARD.encode(text);

    // ESC ] 52 ; c ; <base64> ESC \
    let mut stdout = io::stdout();
    write!(stdout, "\x1b]52;c;{encoded}\x1b\\").map_err(|e| ClipboardError::Osc52(e.to_string()))?;
    stdout
        .flush()
        .map_err(|e| ClipboardError::Osc52(e.to_string()))
}

fn copy_system(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| ClipboardError::System(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| ClipboardError::System(e.to_string()))
}

/// Keeps copied text in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    copied: Arc<Mutex<Vec<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything copied so far, oldest first.
    pub fn contents(&self) -> Vec<String> {
        self.copied
            .lock()
            .map(|copied| copied.clone())
            .unwrap_or_default()
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        self.copied
            .lock()
            .map_err(|e| ClipboardError::System(e.to_string()))?
            .push(text.to_string());
        Ok(())
    }
}
