//! Double-submit CSRF protection.
//!
//! A token is `"{random}.{signature}"` signed with the CSRF secret. It is
//! rendered into every protected form as the `csrf` field and stored in a
//! `csrf` cookie, whose value is additionally signed with the session
//! secrets. A submission passes when the cookie verifies, the field is
//! present, both tokens match, and the token's own signature verifies.

use std::collections::HashMap;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

use crate::signing::{Signer, SigningError};

/// Name of both the cookie and the form field.
pub const CSRF_COOKIE: &str = "csrf";

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "csrf";

/// Random bytes per token.
const TOKEN_BYTES: usize = 32;

/// Why a submission failed the CSRF check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CsrfError {
    /// The request carried no `csrf` cookie.
    #[error("missing CSRF token in cookie")]
    MissingTokenInCookie,

    /// The cookie's session signature did not verify.
    #[error("invalid CSRF token in cookie")]
    InvalidTokenInCookie,

    /// The form had no `csrf` field.
    #[error("missing CSRF token in body")]
    MissingTokenInBody,

    /// The form token differs from the cookie token.
    #[error("CSRF tokens do not match")]
    MismatchedToken,

    /// The token's own signature did not verify.
    #[error("tampered CSRF token in cookie")]
    TamperedToken,
}

/// Issues and validates CSRF tokens.
#[derive(Debug, Clone)]
pub struct Csrf {
    cookie_signer: Signer,
    token_signer: Signer,
    secure: bool,
}

impl Csrf {
    /// Build from the session secrets (cookie signing) and the CSRF
    /// secret (token signing).
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::NoSecrets`] if either secret is empty.
    pub fn new(session_secret: &str, csrf_secret: &str, secure: bool) -> Result<Self, SigningError> {
        Ok(Self {
            cookie_signer: Signer::new(session_secret)?,
            token_signer: Signer::new(csrf_secret)?,
            secure,
        })
    }

    /// Generate a fresh signed token.
    ///
    /// # Errors
    ///
    /// Propagates signing failures.
    pub fn generate(&self) -> Result<String, SigningError> {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::rng().fill(&mut bytes);
        self.token_signer.sign(&URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Token for the page being rendered.
    ///
    /// Reuses the token from a valid `csrf` cookie so that several open
    /// tabs share one token; otherwise generates a new token and returns
    /// the cookie to set.
    ///
    /// # Errors
    ///
    /// Propagates signing failures.
    pub fn commit_token(
        &self,
        jar: &CookieJar,
    ) -> Result<(String, Option<Cookie<'static>>), SigningError> {
        let reusable = self
            .cookie_token(jar)
            .filter(|existing| self.token_signer.unsign(existing).is_some());
        if let Some(existing) = reusable {
            return Ok((existing, None));
        }

        let token = self.generate()?;
        let value = self.cookie_signer.sign(&token)?;
        let cookie = Cookie::build((CSRF_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();
        Ok((token, Some(cookie)))
    }

    /// Check a submitted form against the request cookies.
    ///
    /// # Errors
    ///
    /// Returns the first [`CsrfError`] encountered.
    pub fn validate(
        &self,
        form: &HashMap<String, String>,
        jar: &CookieJar,
    ) -> Result<(), CsrfError> {
        let cookie = jar.get(CSRF_COOKIE).ok_or(CsrfError::MissingTokenInCookie)?;
        let cookie_token = self
            .cookie_signer
            .unsign(cookie.value())
            .ok_or(CsrfError::InvalidTokenInCookie)?;
        let form_token = form.get(CSRF_FIELD).ok_or(CsrfError::MissingTokenInBody)?;
        if form_token != cookie_token {
            return Err(CsrfError::MismatchedToken);
        }
        if self.token_signer.unsign(form_token).is_none() {
            return Err(CsrfError::TamperedToken);
        }
        Ok(())
    }

    fn cookie_token(&self, jar: &CookieJar) -> Option<String> {
        let cookie = jar.get(CSRF_COOKIE)?;
        self.cookie_signer.unsign(cookie.value()).map(str::to_owned)
    }
}
