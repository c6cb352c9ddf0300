//! HTML rendering with `minijinja`.
//!
//! Templates are compiled into the binary and loaded once at startup.
//! Files ending in `.html` are auto-escaped; the only raw insertion is the
//! client-hint script, which is a compile-time constant.

use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde::Serialize;
use tempo_types::{IndexData, Theme, ThemePreference, resolve_theme};

use crate::error::WebError;
use crate::forms::{ActionResult, UrlForm};
use crate::hints::{CHECK_SCRIPT, RequestInfo};
use crate::honeypot::HoneypotInputProps;

/// Index page.
pub const INDEX: &str = "index.html";

/// Not-found page.
pub const NOT_FOUND: &str = "not_found.html";

const LAYOUT: &str = "layout.html";

/// Compiled templates.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Load the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if a template fails to parse.
    pub fn new() -> Result<Self, WebError> {
        let mut env = Environment::new();
        env.add_template(LAYOUT, include_str!("../templates/layout.html"))?;
        env.add_template(INDEX, include_str!("../templates/index.html"))?;
        env.add_template(NOT_FOUND, include_str!("../templates/not_found.html"))?;
        Ok(Self { env })
    }

    /// Render `name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] for an unknown template or a render
    /// failure.
    pub fn render<S: Serialize>(&self, name: &str, context: &S) -> Result<String, WebError> {
        Ok(self.env.get_template(name)?.render(context)?)
    }
}

// ---------------------------------------------------------------------------
// View models
// ---------------------------------------------------------------------------

/// Data every page's layout needs.
#[derive(Debug, Clone, Serialize)]
pub struct Shell {
    /// Document title.
    pub title: &'static str,
    /// Theme the page is rendered with.
    pub theme: Theme,
    /// Current preference, shown on the switcher.
    pub preference: ThemePreference,
    /// Preference the switcher submits.
    pub next_preference: ThemePreference,
    /// Switcher label for the current preference.
    pub preference_label: &'static str,
    /// Label of the preference the switcher moves to.
    pub next_label: &'static str,
    /// Request info.
    pub request_info: RequestInfo,
    /// Inline client-hint script.
    pub hints_script: &'static str,
}

impl Shell {
    /// Build the layout data, resolving the theme from an optimistic
    /// choice, the stored cookie and the client hint.
    pub fn new(
        title: &'static str,
        request_info: RequestInfo,
        optimistic: Option<ThemePreference>,
    ) -> Self {
        let stored = request_info.user_prefs.theme;
        let theme = resolve_theme(optimistic, stored, request_info.hints.theme);
        let preference = optimistic.unwrap_or_else(|| stored.map_or(ThemePreference::System, Into::into));
        let next_preference = preference.next();
        Self {
            title,
            theme,
            preference,
            next_preference,
            preference_label: preference.label(),
            next_label: next_preference.label(),
            request_info,
            hints_script: CHECK_SCRIPT,
        }
    }
}

/// State of the URL form as rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrlFormView {
    /// Value to pre-fill.
    pub value: String,
    /// Field error under the input.
    pub error: Option<String>,
    /// Form-level error.
    pub form_error: Option<String>,
    /// Processed URL.
    pub success_url: Option<String>,
}

impl From<&ActionResult<UrlForm>> for UrlFormView {
    fn from(result: &ActionResult<UrlForm>) -> Self {
        let submission = result.submission();
        let mut view = Self {
            value: submission.payload.get("url").cloned().unwrap_or_default(),
            error: submission.first_error("url").map(str::to_owned),
            ..Self::default()
        };
        match result {
            ActionResult::Error { error, .. } => view.form_error = Some(error.clone()),
            ActionResult::Success { url, .. } => view.success_url.clone_from(url),
            ActionResult::Idle { .. } => {}
        }
        view
    }
}

/// Marker position on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Globe {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
}

/// Context of the index page.
#[derive(Debug, Clone, Serialize)]
pub struct IndexView {
    /// Layout data.
    pub shell: Shell,
    /// CSRF token for the form.
    pub csrf_token: String,
    /// Honeypot inputs for the form.
    pub honeypot: HoneypotInputProps,
    /// Index loader data.
    pub data: IndexData,
    /// Render time as `HH:MM:SS` UTC, shown until the script takes over.
    pub time_display: String,
    /// Edge properties, pretty-printed.
    pub cf_json: String,
    /// Client hints, pretty-printed.
    pub hints_json: String,
    /// Globe marker, when the edge reported coordinates.
    pub globe: Option<Globe>,
    /// URL form state.
    pub form: UrlFormView,
}

impl IndexView {
    /// Assemble the page context.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Serialization`] if the debug blocks cannot be
    /// encoded.
    pub fn new(
        shell: Shell,
        csrf_token: String,
        honeypot: HoneypotInputProps,
        data: IndexData,
        form: UrlFormView,
    ) -> Result<Self, WebError> {
        let time_display = DateTime::parse_from_rfc3339(&data.time)
            .map(|t| t.with_timezone(&Utc).format("%H:%M:%S").to_string())
            .unwrap_or_else(|_| data.time.clone());
        let cf_json = serde_json::to_string_pretty(&data.cf)?;
        let hints_json = serde_json::to_string_pretty(&shell.request_info.hints)?;
        let globe = data
            .cf
            .coordinates()
            .map(|(latitude, longitude)| Globe {
                latitude,
                longitude,
            });
        Ok(Self {
            shell,
            csrf_token,
            honeypot,
            data,
            time_display,
            cf_json,
            hints_json,
            globe,
            form,
        })
    }
}

/// Context of the not-found page.
#[derive(Debug, Clone, Serialize)]
pub struct NotFoundView {
    /// Layout data.
    pub shell: Shell,
    /// The path that was requested.
    pub path: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempo_types::{ClientHints, RequestGeo};

    use super::*;
    use crate::hints::UserPrefs;

    fn info(stored: Option<Theme>, hint: Theme) -> RequestInfo {
        RequestInfo {
            hints: ClientHints {
                theme: hint,
                time_zone: String::from("UTC"),
            },
            origin: String::from("http://localhost"),
            path: String::from("/"),
            user_prefs: UserPrefs { theme: stored },
        }
    }

    #[test]
    fn shell_resolves_theme_and_switcher() {
        let shell = Shell::new("t", info(None, Theme::Dark), None);
        assert_eq!(shell.theme, Theme::Dark);
        assert_eq!(shell.preference, ThemePreference::System);
        assert_eq!(shell.next_preference, ThemePreference::Light);

        let shell = Shell::new("t", info(Some(Theme::Light), Theme::Dark), Some(ThemePreference::Dark));
        assert_eq!(shell.theme, Theme::Dark);
        assert_eq!(shell.next_preference, ThemePreference::System);
    }

    #[test]
    fn not_found_page_escapes_the_path() {
        let templates = Templates::new().unwrap();
        let view = NotFoundView {
            shell: Shell::new("Not found", info(None, Theme::Light), None),
            path: String::from("/<script>"),
        };
        let html = templates.render(NOT_FOUND, &view).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("class=\"light\""));
    }

    #[test]
    fn index_page_renders_form_state() {
        let templates = Templates::new().unwrap();
        let data = IndexData {
            cf: RequestGeo::default(),
            time: String::from("2024-01-01T00:00:00.000Z"),
        };
        let honeypot = HoneypotInputProps {
            name_field_name: "name__confirm",
            valid_from_field_name: "from__confirm",
            encrypted_valid_from: String::from("1.sig"),
        };
        let form = UrlFormView {
            value: String::from("http://a.io"),
            error: Some(String::from("URL must start with https://")),
            form_error: Some(String::from("Invalid submission")),
            success_url: None,
        };
        let shell = Shell::new("Tempo", info(None, Theme::Light), None);
        let view = IndexView::new(shell, String::from("tok.sig"), honeypot, data, form).unwrap();
        assert_eq!(view.time_display, "00:00:00");
        assert!(view.globe.is_none());

        let html = templates.render(INDEX, &view).unwrap();
        assert!(html.contains("datetime=\"2024-01-01T00:00:00.000Z\""));
        assert!(html.contains("URL must start with https:"));
        assert!(html.contains("name=\"csrf\" value=\"tok.sig\""));
        assert!(html.contains("name=\"name__confirm\""));
    }
}
