//! Account command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context as _, Result, bail};
use todo_hive_app::render::render_user_info;
use todo_hive_app::{UiEvent, View};

use super::{Context, NOT_LOGGED_IN, alert_error, print_warnings};

pub async fn register(ctx: &Context, username: &str, password: Option<String>) -> Result<()> {
    let (password, confirm) = match password {
        Some(password) => (password.clone(), password),
        None => {
            let password = read_secret("Password: ")?;
            let confirm = if io::stdin().is_terminal() {
                read_secret("Confirm password: ")?
            } else {
                password.clone()
            };
            (password, confirm)
        }
    };

    let (mut runtime, mut state) = ctx.controller()?;
    runtime
        .dispatch(
            &mut state,
            UiEvent::SubmitRegister {
                username: username.to_string(),
                password,
                confirm,
            },
        )
        .await;

    if let Some(alert) = state.last_error() {
        bail!("{}", alert.message);
    }

    let username = username.trim();
    if state.view == View::Dashboard {
        println!("✓ Registered and logged in as {username}");
        println!("  Session saved to: {}", ctx.store.path().display());
    } else {
        println!("✓ Registered {username}");
        println!("  Log in with: todo-hive login --username {username}");
    }
    Ok(())
}

pub async fn login(ctx: &Context, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_secret("Password: ")?,
    };

    let (mut runtime, mut state) = ctx.controller()?;
    runtime
        .dispatch(
            &mut state,
            UiEvent::SubmitLogin {
                username: username.to_string(),
                password,
            },
        )
        .await;

    if state.view != View::Dashboard {
        return Err(alert_error(&state, "Login failed"));
    }

    let name = state
        .current_user
        .as_ref()
        .map_or(username.trim(), |user| user.username.as_str());
    println!("✓ Logged in as {name} ({} backend)", state.variant());
    println!("  Session saved to: {}", ctx.store.path().display());
    print_warnings(&state);
    Ok(())
}

pub async fn logout(ctx: &Context, forget_backend: bool) -> Result<()> {
    let (mut runtime, mut state) = ctx.controller()?;
    let had_token = state.session.is_authenticated();

    runtime.dispatch(&mut state, UiEvent::Logout).await;
    if forget_backend {
        runtime
            .client()
            .forget_backend()
            .context("forget backend variant")?;
    }

    if had_token {
        println!("✓ Logged out");
        println!("  Token removed from: {}", ctx.store.path().display());
    } else {
        println!("Not logged in (no session found).");
    }
    if forget_backend {
        println!("  Backend detection reset.");
    }
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let (mut runtime, mut state) = ctx.controller()?;
    if !state.session.is_authenticated() {
        bail!(NOT_LOGGED_IN);
    }

    runtime.dispatch(&mut state, UiEvent::Startup).await;
    if state.view != View::Dashboard {
        return Err(alert_error(&state, "Session is no longer valid"));
    }

    let card = render_user_info(state.current_user.as_ref(), state.session.token.as_deref());
    println!("Username: {}", card.username);
    println!("ID:       {}", card.id);
    println!("Created:  {}", card.created);
    println!("Token:    {}", card.token);
    println!("Backend:  {}", state.variant());
    if state.current_user.is_none() {
        println!("  ({} backends have no profile endpoint)", state.variant());
    }
    Ok(())
}

/// Reads one line from stdin, prompting on stderr when interactive.
///
/// The trailing newline is removed; other whitespace is kept.
fn read_secret(prompt: &str) -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("{prompt}");
        io::stderr().flush()?;
    }

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
