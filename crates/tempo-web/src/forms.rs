//! Form parsing and validation.
//!
//! A posted form becomes a [`Submission`]: the intent taken from the
//! `__intent__` field, the echoed payload, per-field error messages and,
//! for a valid `submit`, the typed value. Schemas implement
//! [`FormSchema`] on top of `validator`'s [`Validate`].

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use axum::http::StatusCode;
use serde::{Serialize, Serializer};
use tempo_types::ThemePreference;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::csrf::CSRF_FIELD;
use crate::honeypot::{NAME_FIELD, VALID_FROM_FIELD};

/// Field naming the submission intent.
pub const INTENT_FIELD: &str = "__intent__";

/// Fields never echoed back in the payload.
const HIDDEN_FIELDS: [&str; 4] = [INTENT_FIELD, CSRF_FIELD, NAME_FIELD, VALID_FROM_FIELD];

/// Messages per field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// What the client asked the action to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Validate and process the form.
    Submit,
    /// Validate a single field (`validate/<field>`) while typing.
    Validate(String),
    /// Any other intent; processed as a no-op.
    Other(String),
}

impl Intent {
    /// Parse the raw field; a missing field means [`Intent::Submit`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("submit") => Self::Submit,
            Some(other) => other.strip_prefix("validate/").map_or_else(
                || Self::Other(other.to_owned()),
                |field| Self::Validate(field.to_owned()),
            ),
        }
    }

    /// Whether the form should be processed.
    pub const fn is_submit(&self) -> bool {
        matches!(self, Self::Submit)
    }
}

impl core::fmt::Display for Intent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Submit => f.write_str("submit"),
            Self::Validate(field) => write!(f, "validate/{field}"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A schema that can be built from raw form fields.
pub trait FormSchema: Validate + Sized {
    /// Convert raw fields, reporting missing or mistyped fields.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is absent or cannot be
    /// converted; `validator` rules run only after a successful build.
    fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FieldErrors>;
}

/// Outcome of parsing a posted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission<T> {
    /// The submission intent.
    pub intent: Intent,
    /// Submitted fields, without intent and protection fields.
    pub payload: BTreeMap<String, String>,
    /// Messages per field; empty when valid.
    pub error: FieldErrors,
    /// The typed value, present only for a valid `submit`.
    #[serde(skip)]
    pub value: Option<T>,
}

impl<T> Submission<T> {
    /// Whether any field failed.
    pub fn has_errors(&self) -> bool {
        !self.error.is_empty()
    }

    /// First message for `field`.
    pub fn first_error(&self, field: &str) -> Option<&str> {
        self.error.get(field)?.first().map(String::as_str)
    }
}

/// Parse and validate `fields` with schema `T`.
///
/// For a `validate/<field>` intent only that field's errors are kept.
pub fn parse<T: FormSchema>(fields: &HashMap<String, String>) -> Submission<T> {
    let intent = Intent::parse(fields.get(INTENT_FIELD).map(String::as_str));
    let payload = fields
        .iter()
        .filter(|(name, _)| !HIDDEN_FIELDS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let (value, mut error) = match T::from_fields(fields) {
        Ok(value) => match value.validate() {
            Ok(()) => (Some(value), FieldErrors::new()),
            Err(errors) => (None, collect_errors(&errors)),
        },
        Err(errors) => (None, errors),
    };

    if let Intent::Validate(field) = &intent {
        error.retain(|name, _| name == field);
    }

    Submission {
        value: value.filter(|_| intent.is_submit()),
        intent,
        payload,
        error,
    }
}

fn collect_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, list)| (field.to_string(), list.iter().map(message).collect()))
        .collect()
}

fn message(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map_or_else(|| error.code.to_string(), ToString::to_string)
}

fn required(field: &str) -> FieldErrors {
    FieldErrors::from([(field.to_owned(), vec![String::from("Required")])])
}

// ---------------------------------------------------------------------------
// Action results
// ---------------------------------------------------------------------------

/// Message for a submission that failed validation.
pub const INVALID_SUBMISSION: &str = "Invalid submission";

/// JSON body of a form action, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResult<T> {
    /// A non-submit intent; nothing was processed.
    Idle {
        /// The parsed submission.
        submission: Submission<T>,
    },
    /// Validation failed.
    Error {
        /// The parsed submission, with field errors.
        submission: Submission<T>,
        /// Form-level message.
        error: String,
    },
    /// The submission was processed.
    Success {
        /// The parsed submission.
        submission: Submission<T>,
        /// Echoed URL, for the URL form.
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl<T> ActionResult<T> {
    /// Classify a submission; `echo` picks the value returned on success.
    pub fn from_submission(
        submission: Submission<T>,
        echo: impl FnOnce(&T) -> Option<String>,
    ) -> Self {
        if !submission.intent.is_submit() {
            return Self::Idle { submission };
        }
        let echoed = match submission.value.as_ref() {
            Some(value) if !submission.has_errors() => Some(echo(value)),
            _ => None,
        };
        match echoed {
            Some(url) => Self::Success { submission, url },
            None => Self::Error {
                submission,
                error: String::from(INVALID_SUBMISSION),
            },
        }
    }

    /// HTTP status: 400 for errors, 200 otherwise.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Error { .. } => StatusCode::BAD_REQUEST,
            Self::Idle { .. } | Self::Success { .. } => StatusCode::OK,
        }
    }

    /// The submission, whatever the outcome.
    pub const fn submission(&self) -> &Submission<T> {
        match self {
            Self::Idle { submission }
            | Self::Error { submission, .. }
            | Self::Success { submission, .. } => submission,
        }
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// The index page's URL form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct UrlForm {
    /// An absolute `https://` URL.
    #[validate(url(message = "Invalid url"), custom(function = "require_https"))]
    pub url: String,
}

fn require_https(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("https").with_message(Cow::Borrowed("URL must start with https://")))
    }
}

impl FormSchema for UrlForm {
    fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        match fields.get("url").map(|u| u.trim()) {
            Some(url) if !url.is_empty() => Ok(Self {
                url: url.to_owned(),
            }),
            _ => Err(required("url")),
        }
    }
}

/// The theme switcher form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Validate)]
pub struct ThemeForm {
    /// The requested preference.
    pub theme: ThemePreference,
}

impl FormSchema for ThemeForm {
    fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let raw = fields
            .get("theme")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| required("theme"))?;
        raw.parse()
            .map(|theme| Self { theme })
            .map_err(|_| {
                FieldErrors::from([(
                    String::from("theme"),
                    vec![format!(
                        "Invalid enum value. Expected 'system' | 'light' | 'dark', received '{raw}'"
                    )],
                )])
            })
    }
}
