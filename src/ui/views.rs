//! HTML views rendered from embedded templates

use minijinja::{context, Environment, ErrorKind};
use rust_embed::RustEmbed;

use crate::config::IdleConfig;
use crate::error::Result;
use crate::nav::Section;
use crate::session::SessionMarker;

/// Templates and static files compiled into the binary
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| {
            let Some(file) = Assets::get(&format!("templates/{}", name)) else {
                return Ok(None);
            };
            String::from_utf8(file.data.into_owned()).map(Some).map_err(|_| {
                minijinja::Error::new(ErrorKind::InvalidOperation, "template is not valid UTF-8")
            })
        });
        Self { env }
    }

    /// The login view. `requested` is the section the visitor asked for.
    pub fn login(
        &self,
        requested: Option<Section>,
        error: Option<&str>,
        username: Option<&str>,
    ) -> Result<String> {
        let template = self.env.get_template("login.html")?;
        Ok(template.render(context! {
            title => "Sign in",
            requested => requested.map(|s| s.title()),
            error => error,
            username => username.unwrap_or_default(),
        })?)
    }

    /// The application shell with `section` selected
    pub fn app(
        &self,
        marker: &SessionMarker,
        section: Section,
        idle: &IdleConfig,
        logout_prompt: bool,
    ) -> Result<String> {
        let sections: Vec<_> = Section::ALL
            .iter()
            .map(|s| {
                context! {
                    slug => s.slug(),
                    title => s.title(),
                    active => *s == section,
                }
            })
            .collect();

        let template = self.env.get_template("app.html")?;
        Ok(template.render(context! {
            title => section.title(),
            username => &marker.username,
            role => marker.role.label(),
            mode => marker.mode.to_string(),
            sections => sections,
            section => context! { slug => section.slug(), title => section.title() },
            countdown_secs => idle.countdown_secs,
            logout_prompt => logout_prompt,
        })?)
    }
}

impl Default for Views {
    fn default() -> Self {
        Self::new()
    }
}

/// Content type for an embedded static file
pub fn content_type(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("html") => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{User, UserRole};
    use crate::session::PersistenceMode;

    #[test]
    fn test_login_view_shows_error() {
        let views = Views::new();
        let html = views
            .login(Some(Section::Audit), Some("Invalid username or password"), Some("admin"))
            .unwrap();
        assert!(html.contains("Invalid username or password"));
        assert!(html.contains(r#"name="remember_me""#));
        assert!(html.contains("Audit Log"));
    }

    #[test]
    fn test_login_view_escapes_username() {
        let views = Views::new();
        let html = views.login(None, None, Some("<script>")).unwrap();
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_app_view_lists_sections() {
        let views = Views::new();
        let marker =
            SessionMarker::issue(&User::new("editor", UserRole::Editor), PersistenceMode::Ephemeral);
        let html = views
            .app(&marker, Section::Royalties, &IdleConfig::default(), false)
            .unwrap();

        for section in Section::ALL {
            assert!(html.contains(&format!("/sections/{}", section.slug())));
        }
        assert!(html.contains("idle-warning"));
        assert!(!html.contains("confirm-logout-btn"));
    }

    #[test]
    fn test_app_view_logout_prompt() {
        let views = Views::new();
        let marker =
            SessionMarker::issue(&User::new("admin", UserRole::Administrator), PersistenceMode::Durable);
        let html = views
            .app(&marker, Section::Dashboard, &IdleConfig::default(), true)
            .unwrap();
        assert!(html.contains("confirm-logout-btn"));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type("idle.js"), "application/javascript");
        assert_eq!(content_type("style.css"), "text/css");
        assert_eq!(content_type("blob"), "application/octet-stream");
    }
}
