//! Token command handlers.

use anyhow::{Context as _, Result, bail};
use todo_hive_app::UiEvent;
use todo_hive_core::session::TokenStore;

use super::{Context, NOT_LOGGED_IN, alert_error};

pub fn show(ctx: &Context) -> Result<()> {
    let Some(token) = ctx.store.get().context("read session")? else {
        bail!(NOT_LOGGED_IN);
    };
    println!("{token}");
    Ok(())
}

pub async fn copy(ctx: &Context) -> Result<()> {
    let (mut runtime, mut state) = ctx.controller()?;
    runtime.dispatch(&mut state, UiEvent::CopyToken).await;
    if state.last_error().is_some() {
        return Err(alert_error(&state, "Copy failed"));
    }
    println!("✓ Token copied to clipboard");
    Ok(())
}

pub async fn verify(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let Some(token) = client.token()? else {
        bail!(NOT_LOGGED_IN);
    };

    let check = client.verify_token(&token).await?;
    match (check.valid, check.user) {
        (true, Some(user)) => println!("✓ Token is valid for {}", user.username),
        (true, None) => println!("✓ Token is valid"),
        (false, _) => bail!(
            "Token is not valid: {}",
            check.error.as_deref().unwrap_or("no reason given")
        ),
    }
    Ok(())
}
