//! Colour scheme preference and its resolution against client hints.
//!
//! The persisted preference is a [`ThemePreference`]; the page is always
//! rendered with a concrete [`Theme`]. `System` defers to the browser's
//! `prefers-color-scheme` hint.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A concrete colour scheme the page is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background, dark text.
    Light,
    /// Dark background, light text.
    Dark,
}

/// The user's stored preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Follow the operating system / browser setting.
    #[default]
    System,
    /// Always light.
    Light,
    /// Always dark.
    Dark,
}

/// Returned when a string is not a known theme name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct ParseThemeError(pub String);

impl Theme {
    /// Lowercase name, as used in cookies and CSS classes.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl ThemePreference {
    /// All preferences in switcher order.
    pub const ALL: [Self; 3] = [Self::System, Self::Light, Self::Dark];

    /// Lowercase name, as submitted by the theme form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Human-readable label for the switcher button.
    pub const fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Light => "Light",
            Self::Dark => "Dark",
        }
    }

    /// The preference the switcher moves to next: system, light, dark,
    /// then back to system.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::System => Self::Light,
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
        }
    }

    /// The concrete theme this preference pins, if any.
    pub const fn fixed(self) -> Option<Theme> {
        match self {
            Self::System => None,
            Self::Light => Some(Theme::Light),
            Self::Dark => Some(Theme::Dark),
        }
    }
}

impl From<Theme> for ThemePreference {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::Light,
            Theme::Dark => Self::Dark,
        }
    }
}

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ParseThemeError(other.to_owned())),
        }
    }
}

impl FromStr for ThemePreference {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ParseThemeError(other.to_owned())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide the theme to render.
///
/// An in-flight (optimistic) change wins over the stored preference, and
/// both fall back to the client hint when they say `System` or are absent.
pub fn resolve_theme(
    optimistic: Option<ThemePreference>,
    stored: Option<Theme>,
    hint: Theme,
) -> Theme {
    match optimistic {
        Some(pending) => pending.fixed().unwrap_or(hint),
        None => stored.unwrap_or(hint),
    }
}
