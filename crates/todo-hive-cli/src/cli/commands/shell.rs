//! Interactive line-based front-end driving the controller.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::{Context as _, Result};
use todo_hive_app::UiEvent;
use todo_hive_app::render::render;

use super::{Context, output_width};

const HELP: &str = "\
Commands:
  login <username> <password>
  register <username> <password> <confirm>
  view login|register        switch between the sign-in forms
  draft <content>            stage todo text and show its length
  add <content>              add a todo (Worker A)
  refresh                    reload todos
  copy                       copy the session token to the clipboard
  logout
  help
  quit";

#[derive(Debug)]
enum ShellCommand {
    Event(UiEvent),
    Help,
    Quit,
    Nothing,
}

pub async fn run(ctx: &Context) -> Result<()> {
    let (mut runtime, mut state) = ctx.controller()?;
    println!(
        "todo-hive shell connected to {} (type `help` for commands)",
        ctx.base_url
    );
    runtime.dispatch(&mut state, UiEvent::Startup).await;

    let mut lines = io::stdin().lock().lines();
    loop {
        runtime.dismiss_expired(&mut state, Instant::now());
        print!("{}", render(&state).to_text(output_width()));
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("read command")?;

        match parse_command(&line) {
            Ok(ShellCommand::Event(event)) => runtime.dispatch(&mut state, event).await,
            Ok(ShellCommand::Help) => println!("{HELP}"),
            Ok(ShellCommand::Quit) => break,
            Ok(ShellCommand::Nothing) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
    Ok(())
}

/// Maps one input line to a controller event.
///
/// Missing credentials are passed through as empty strings so the
/// controller reports them like any other validation failure.
fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace().map(str::to_string);
    let mut next = || args.next().unwrap_or_default();

    let event = match command {
        "" => return Ok(ShellCommand::Nothing),
        "help" | "?" => return Ok(ShellCommand::Help),
        "quit" | "exit" => return Ok(ShellCommand::Quit),
        "login" => UiEvent::SubmitLogin {
            username: next(),
            password: next(),
        },
        "register" => UiEvent::SubmitRegister {
            username: next(),
            password: next(),
            confirm: next(),
        },
        "view" => match rest {
            "login" => UiEvent::ShowLogin,
            "register" => UiEvent::ShowRegister,
            other => return Err(format!("Unknown view: {other}. Use `login` or `register`.")),
        },
        "draft" => UiEvent::EditDraft {
            content: rest.to_string(),
        },
        "add" => UiEvent::SubmitTodo {
            content: rest.to_string(),
        },
        "refresh" => UiEvent::RefreshTodos,
        "copy" => UiEvent::CopyToken,
        "logout" => UiEvent::Logout,
        other => {
            return Err(format!(
                "Unknown command: {other}. Type `help` for commands."
            ));
        }
    };
    Ok(ShellCommand::Event(event))
}
