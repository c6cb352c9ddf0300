//! Environment-based configuration for the web application.
//!
//! Network and stream settings are validated at startup. Secrets are
//! optional at startup and checked on every request that needs them, so a
//! misconfigured deployment still serves the stream and the health check
//! while failing form pages with a descriptive error.

use std::time::Duration;

use tempo_stream::DEFAULT_PERIOD;

use crate::error::WebError;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    Invalid {
        /// The environment variable.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
    /// Period of the time stream (`STREAM_INTERVAL_MS`).
    pub stream_interval: Duration,
    /// Mark cookies `Secure` (`SECURE_COOKIES`).
    pub secure_cookies: bool,
    /// Signing secrets.
    pub secrets: Secrets,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
            stream_interval: DEFAULT_PERIOD,
            secure_cookies: false,
            secrets: Secrets::default(),
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or boolean variable
    /// cannot be parsed, or if `STREAM_INTERVAL_MS` is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`WebConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let interval_ms = parse_or(&lookup, "STREAM_INTERVAL_MS", 1000_u64)?;
        if interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "STREAM_INTERVAL_MS",
                value: String::from("0"),
            });
        }
        let secure_cookies = parse_or(&lookup, "SECURE_COOKIES", defaults.secure_cookies)?;

        let secrets = Secrets {
            session: non_empty(lookup("SESSION_SECRET")),
            csrf: non_empty(lookup("CSRF_SECRET")),
            honeypot: non_empty(lookup("HONEYPOT_SECRET")),
        };

        Ok(Self {
            host,
            port,
            stream_interval: Duration::from_millis(interval_ms),
            secure_cookies,
            secrets,
        })
    }
}

/// Signing secrets, each optional until a request needs it.
#[derive(Clone, Default)]
pub struct Secrets {
    /// Comma-separated cookie signing secrets; the first signs, all verify.
    pub session: Option<String>,
    /// CSRF token signing secret.
    pub csrf: Option<String>,
    /// Honeypot timestamp signing secret.
    pub honeypot: Option<String>,
}

impl core::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Secrets")
            .field("session", &self.session.as_ref().map(|_| "<redacted>"))
            .field("csrf", &self.csrf.as_ref().map(|_| "<redacted>"))
            .field("honeypot", &self.honeypot.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// All three secrets, borrowed after a successful [`Secrets::require`].
#[derive(Clone, Copy)]
pub struct RequiredSecrets<'a> {
    /// See [`Secrets::session`].
    pub session: &'a str,
    /// See [`Secrets::csrf`].
    pub csrf: &'a str,
    /// See [`Secrets::honeypot`].
    pub honeypot: &'a str,
}

impl Secrets {
    /// Build a set with every secret present.
    pub fn new(
        session: impl Into<String>,
        csrf: impl Into<String>,
        honeypot: impl Into<String>,
    ) -> Self {
        Self {
            session: non_empty(Some(session.into())),
            csrf: non_empty(Some(csrf.into())),
            honeypot: non_empty(Some(honeypot.into())),
        }
    }

    /// Check that every secret is configured.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::MissingSecret`] naming the first missing
    /// variable, in the order `SESSION_SECRET`, `HONEYPOT_SECRET`,
    /// `CSRF_SECRET`.
    pub fn require(&self) -> Result<RequiredSecrets<'_>, WebError> {
        let session = self
            .session
            .as_deref()
            .ok_or(WebError::MissingSecret("SESSION_SECRET"))?;
        let honeypot = self
            .honeypot
            .as_deref()
            .ok_or(WebError::MissingSecret("HONEYPOT_SECRET"))?;
        let csrf = self
            .csrf
            .as_deref()
            .ok_or(WebError::MissingSecret("CSRF_SECRET"))?;
        Ok(RequiredSecrets {
            session,
            csrf,
            honeypot,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
