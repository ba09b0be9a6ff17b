//! Backend service command handlers.

use anyhow::{Context as _, Result};
use todo_hive_core::session::mask_token;

use super::Context;

pub async fn health(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let health = client
        .health()
        .await
        .with_context(|| format!("health check against {}", client.base_url()))?;

    match health.service {
        Some(service) => println!("{service}: {}", health.status),
        None => println!("{}", health.status),
    }
    Ok(())
}

pub async fn info(ctx: &Context, json: bool) -> Result<()> {
    let client = ctx.client()?;
    let info = client.service_info().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", info.service, info.version);
    for (name, endpoint) in &info.endpoints {
        println!("  {name:<16} {endpoint}");
    }
    Ok(())
}

/// Prints local session state. Makes no requests.
pub fn status(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let negotiated = client.negotiate()?;

    let source = if negotiated.is_detected() {
        "detected"
    } else if ctx.config.backend.pinned().is_some() {
        "assumed, pinned in config"
    } else {
        "assumed"
    };

    println!("Base URL: {}", client.base_url());
    println!("Backend:  {} ({source})", negotiated.variant());
    match client.token()? {
        Some(token) => println!("Session:  logged in (token {})", mask_token(&token)),
        None => println!("Session:  not logged in"),
    }
    println!("Session file: {}", ctx.store.path().display());
    Ok(())
}
