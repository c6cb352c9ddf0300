//! Theme preference cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tempo_types::{Theme, ThemePreference};

/// Cookie holding `light` or `dark`. Absent means "follow the system".
pub const THEME_COOKIE: &str = "theme";

/// The stored theme, if the cookie holds a known value.
pub fn get_theme(jar: &CookieJar) -> Option<Theme> {
    jar.get(THEME_COOKIE)?.value().parse().ok()
}

/// Persist `preference`: a fixed theme is stored for a long time, `system`
/// removes the cookie.
pub fn set_theme(jar: CookieJar, preference: ThemePreference, secure: bool) -> CookieJar {
    match preference.fixed() {
        Some(theme) => jar.add(
            Cookie::build((THEME_COOKIE, theme.as_str()))
                .path("/")
                .secure(secure)
                .same_site(SameSite::Lax)
                .permanent(),
        ),
        None => jar.remove(Cookie::build(THEME_COOKIE).path("/")),
    }
}
