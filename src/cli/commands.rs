//! CLI command implementations

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::models::Credential;
use crate::cli::{error, info, print_session_detail, print_session_table, success, warn, OutputFormat};
use crate::config::{self, loader::CONFIG_FILENAME, Config};
use crate::context::Console;
use crate::nav::Section;
use crate::session::{FileScope, PersistenceMode, StorageScope, MARKER_KEY};
use crate::ui::Views;

/// Initialize a new royalty-desk.toml configuration file
pub async fn init(path: Option<&Path>, force: bool) -> Result<()> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

    if config_path.exists() && !force {
        warn(&format!("{} already exists (use --force to overwrite)", config_path.display()));
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    success(&format!("Created {}", config_path.display()));
    info("Set ROYALTY_DESK_SECRET and run 'royalty-desk serve' to start the dashboard");

    Ok(())
}

/// Start the HTTP server
pub async fn serve(path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(path)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// Sign in from the terminal
pub async fn login(path: Option<&Path>, username: Option<String>, remember: bool) -> Result<()> {
    let config = load_config(path)?;

    let username = match username {
        Some(username) => username,
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Username")
            .interact_text()?,
    };
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;

    let mut console = Console::open(&config);
    match console.login(&Credential::new(username, password), remember) {
        Ok(marker) => {
            success(&format!("Signed in as {} ({})", marker.username, marker.role));
            if marker.mode == PersistenceMode::Ephemeral {
                warn("Session-only sign-in ends when this command exits; use --remember or 'royalty-desk shell'");
            }
            Ok(())
        }
        Err(e) => {
            error(&format!("Sign-in failed: {}", e));
            Err(e.into())
        }
    }
}

/// Show the current session
pub async fn status(path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(path)?;
    let console = Console::open(&config);
    let marker = console.current()?;

    match format {
        OutputFormat::Table => {
            print_session_table(marker.as_ref());
            if let Some(marker) = &marker {
                println!();
                print_session_detail(marker);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&marker)?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&marker)?;
            println!("{}", yaml);
        }
    }

    Ok(())
}

/// Sign out after confirmation
pub async fn logout(path: Option<&Path>, yes: bool) -> Result<()> {
    let config = load_config(path)?;
    let mut console = Console::open(&config);

    if console.current()?.is_none() {
        info("Not signed in");
        return Ok(());
    }

    console.request_logout()?;

    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Sign out now?")
            .default(false)
            .interact()?;

    if !confirmed {
        console.cancel_logout();
        info("Cancelled");
        return Ok(());
    }

    let termination = console.confirm_logout()?;
    success(&format!(
        "Signed out {}",
        termination.username.as_deref().unwrap_or("")
    ));
    Ok(())
}

/// Interactive session
pub async fn shell(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    crate::cli::shell::run(&config).await
}

/// Check configuration and session storage
pub async fn doctor(path: Option<&Path>) -> Result<()> {
    println!("Running diagnostics...\n");
    let mut failures = 0;

    let config = match config::load_config_or_default(path) {
        Ok(config) => {
            success("Configuration is valid");
            config
        }
        Err(e) => {
            error(&format!("Configuration: {}", e));
            return Err(e.into());
        }
    };

    if config.session.secret == Config::default().session.secret {
        warn("session.secret is the built-in default; set ROYALTY_DESK_SECRET");
    }

    info(&format!(
        "Idle warning after {}s, countdown from {}",
        config.idle.threshold_secs, config.idle.countdown_secs
    ));
    info(&format!("{} user account(s) configured", config.users.len()));

    let mut scope = FileScope::new(&config.storage.data_dir);
    let probe = "doctor-probe";
    match scope.write(probe, "ok").and_then(|_| scope.remove(probe)) {
        Ok(()) => success(&format!("Storage directory {} is writable", scope.dir().display())),
        Err(e) => {
            error(&format!("Storage: {}", e));
            failures += 1;
        }
    }

    if scope.entry_path(MARKER_KEY).exists() {
        info("A remembered session is stored");
    }

    match Views::new().login(Some(Section::default()), None, None) {
        Ok(_) => success("Templates render"),
        Err(e) => {
            error(&format!("Templates: {}", e));
            failures += 1;
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{} check(s) failed", failures);
    }
    success("All checks passed");
    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<Config> {
    config::load_config_or_default(path).map_err(|e| anyhow::anyhow!("{}", e))
}
