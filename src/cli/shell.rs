//! Interactive terminal session
//!
//! Every line typed counts as a key press, so an idle shell runs through
//! the same warning and countdown as the web page.

use anyhow::Result;
use colored::Colorize;
use console::Term;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::auth::models::Credential;
use crate::cli::{error, info, print_session_detail, print_sections, success, warn};
use crate::config::Config;
use crate::context::Console;
use crate::idle::{ActivityKind, IdleEvent};
use crate::nav::{Section, View};
use crate::session::StorageScope;

enum Flow {
    Continue,
    Quit,
}

pub async fn run(config: &Config) -> Result<()> {
    let mut console = Console::open(config);
    let term = Term::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info("Type 'help' for commands");
    prompt(&console);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                console.interact(ActivityKind::KeyPress);
                if let Flow::Quit = handle_line(&mut console, line.trim()) {
                    break;
                }
                prompt(&console);
            }
            event = console.next_idle_event(), if console.is_monitoring() => {
                match event {
                    Some(IdleEvent::Warning { remaining }) => {
                        println!();
                        warn(&format!(
                            "No activity for {}s. Press Enter to stay signed in.",
                            console.idle_config().threshold_secs
                        ));
                        countdown(&term, remaining)?;
                    }
                    Some(IdleEvent::Tick { remaining }) => countdown(&term, remaining)?,
                    Some(IdleEvent::Resumed) => {
                        term.clear_line()?;
                        info("Still here, countdown cancelled");
                    }
                    Some(IdleEvent::Expired) => {
                        countdown(&term, 0)?;
                        println!();
                        match &console.page().error {
                            Some(e) => error(&format!("Sign-out failed: {}", e)),
                            None => warn("Signed out after inactivity"),
                        }
                        prompt(&console);
                    }
                    None => {}
                }
            }
        }
    }

    Ok(())
}

fn handle_line<D: StorageScope, E: StorageScope>(console: &mut Console<D, E>, line: &str) -> Flow {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Flow::Continue;
    };
    let args: Vec<&str> = parts.collect();

    // A pending confirmation only accepts an answer
    if console.page().logout_prompt && !matches!(command, "confirm" | "cancel" | "quit" | "exit") {
        warn("Answer 'confirm' or 'cancel'");
        return Flow::Continue;
    }

    match command {
        "help" => print_help(),
        "login" => match args.as_slice() {
            [username, password, rest @ ..] => {
                let remember = rest.iter().any(|a| *a == "--remember" || *a == "-r");
                match console.login(&Credential::new(*username, *password), remember) {
                    Ok(marker) => success(&format!("Signed in as {} ({})", marker.username, marker.mode)),
                    Err(e) => error(&e.to_string()),
                }
            }
            _ => warn("Usage: login <username> <password> [--remember]"),
        },
        "open" => match args.first().map(|slug| slug.parse::<Section>()) {
            Some(Ok(section)) => {
                if console.navigate(section).view() == View::Login {
                    warn("Sign in first");
                }
            }
            Some(Err(e)) => error(&e),
            None => warn("Usage: open <section>"),
        },
        "sections" => print_sections(console.page().decision.section()),
        "reload" => {
            console.reload();
            info(&format!("Reloaded (load #{})", console.load_count()));
        }
        "logout" => match console.request_logout() {
            Ok(()) => warn("Sign out? Type 'confirm' or 'cancel'"),
            Err(e) => error(&e.to_string()),
        },
        "confirm" => match console.confirm_logout() {
            Ok(_) => success("Signed out"),
            Err(e) => error(&e.to_string()),
        },
        "cancel" => {
            if console.cancel_logout() {
                info("Still signed in");
            }
        }
        "status" => match console.current() {
            Ok(Some(marker)) => print_session_detail(&marker),
            Ok(None) => info("Not signed in"),
            Err(e) => error(&e.to_string()),
        },
        "quit" | "exit" => return Flow::Quit,
        other => warn(&format!("Unknown command '{}'", other)),
    }

    Flow::Continue
}

fn prompt<D: StorageScope, E: StorageScope>(console: &Console<D, E>) {
    let page = console.page();
    let location = match (page.view(), page.decision.section()) {
        (View::App, Some(section)) => section.slug().to_string(),
        _ => "login".to_string(),
    };
    print!("{} ", format!("{}>", location).cyan());
    let _ = std::io::stdout().flush();
}

fn countdown(term: &Term, remaining: u32) -> std::io::Result<()> {
    term.clear_line()?;
    term.write_str(&format!("  Signing out in {}s", remaining.to_string().red().bold()))
}

fn print_help() {
    println!("  login <user> <password> [--remember]  Sign in");
    println!("  open <section>                        Switch section");
    println!("  sections                              List sections");
    println!("  reload                                Reload the page");
    println!("  logout                                Sign out (asks to confirm)");
    println!("  status                                Show the session");
    println!("  quit                                  Leave the shell");
}
