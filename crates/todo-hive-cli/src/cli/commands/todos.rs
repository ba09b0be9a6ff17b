//! Todo command handlers.

use anyhow::{Result, bail};
use todo_hive_app::render::{render_todos, todos_table};
use todo_hive_app::{UiEvent, View};

use super::{Context, NOT_LOGGED_IN, alert_error, output_width};

pub async fn list(ctx: &Context, json: bool) -> Result<()> {
    let client = ctx.client()?;
    if client.token()?.is_none() {
        bail!(NOT_LOGGED_IN);
    }

    let todos = client.list_todos().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&todos)?);
    } else {
        println!("{}", todos_table(&render_todos(&todos), output_width()));
    }
    Ok(())
}

pub async fn add(ctx: &Context, content: &str) -> Result<()> {
    let (mut runtime, mut state) = ctx.controller()?;
    if !state.session.is_authenticated() {
        bail!(NOT_LOGGED_IN);
    }

    runtime.dispatch(&mut state, UiEvent::Startup).await;
    if state.view != View::Dashboard {
        return Err(alert_error(&state, "Session is no longer valid"));
    }

    runtime
        .dispatch(
            &mut state,
            UiEvent::SubmitTodo {
                content: content.to_string(),
            },
        )
        .await;

    // The draft is only cleared once the backend accepted the todo.
    if !state.todo_draft.is_empty() || state.last_error().is_some() {
        return Err(alert_error(&state, "Failed to add todo"));
    }

    println!("✓ Added todo");
    println!("{}", todos_table(&render_todos(&state.todos), output_width()));
    Ok(())
}
