//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::models::UserRole;
use crate::nav::Section;
use crate::session::{PersistenceMode, SessionMarker};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Persistence mode as a colored string
pub fn format_mode(mode: PersistenceMode) -> String {
    match mode {
        PersistenceMode::Durable => mode.to_string().green().to_string(),
        PersistenceMode::Ephemeral => mode.to_string().yellow().to_string(),
    }
}

fn role_color(role: UserRole) -> Color {
    match role {
        UserRole::Administrator => Color::Red,
        UserRole::Editor => Color::Yellow,
        UserRole::Viewer => Color::Green,
    }
}

/// Print the session as a one-row table
pub fn print_session_table(marker: Option<&SessionMarker>) {
    let Some(marker) = marker else {
        info("Not signed in. Sign in with 'royalty-desk login'");
        return;
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("User").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Mode").fg(Color::Cyan),
            Cell::new("Signed in").fg(Color::Cyan),
            Cell::new("Session").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        Cell::new(&marker.username),
        Cell::new(marker.role.label()).fg(role_color(marker.role)),
        Cell::new(marker.mode.to_string()),
        Cell::new(marker.issued_at.format("%Y-%m-%d %H:%M").to_string()),
        Cell::new(marker.id.to_string()),
    ]);

    println!("{table}");
}

/// Print detailed session information
pub fn print_session_detail(marker: &SessionMarker) {
    println!("{}", "Session Details".bold().underline());
    println!();
    println!("  {} {}", "User:".bold(), marker.username);
    println!("  {} {}", "Role:".bold(), marker.role.label());
    let permissions: Vec<String> = marker
        .role
        .permissions()
        .iter()
        .map(|p| format!("{:?}", p).to_lowercase())
        .collect();
    println!("  {} {}", "Can:".bold(), permissions.join(", "));
    println!("  {} {}", "Mode:".bold(), format_mode(marker.mode));
    println!(
        "  {} {}",
        "Signed in:".bold(),
        marker.issued_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

/// Print the section list, marking the current one
pub fn print_sections(current: Option<Section>) {
    for section in Section::ALL {
        let marker = if Some(section) == current { "●".green() } else { "○".normal() };
        println!("  {} {:<10} {}", marker, section.slug(), section.title());
    }
}
