//! Honeypot spam check.
//!
//! Protected forms carry two hidden inputs: `name__confirm`, which a human
//! never fills, and `from__confirm`, a signed issue timestamp. Bots that
//! fill every field, or replay a form with a forged timestamp, fail the
//! check.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::signing::{Signer, SigningError};

/// Field that must be submitted empty.
pub const NAME_FIELD: &str = "name__confirm";

/// Field carrying the signed issue timestamp.
pub const VALID_FROM_FIELD: &str = "from__confirm";

/// Why a submission failed the honeypot check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HoneypotError {
    /// The trap field was not submitted.
    #[error("missing honeypot input")]
    MissingInput,

    /// The trap field was filled in.
    #[error("honeypot input not empty")]
    InputNotEmpty,

    /// The timestamp field was not submitted.
    #[error("missing honeypot valid-from input")]
    MissingValidFrom,

    /// The timestamp did not verify or parse.
    #[error("invalid honeypot valid-from input")]
    InvalidValidFrom,

    /// The timestamp lies in the future.
    #[error("honeypot valid-from is in the future")]
    FutureValidFrom,
}

/// Values the form template needs to render the hidden inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotInputProps {
    /// Name of the trap field.
    pub name_field_name: &'static str,
    /// Name of the timestamp field.
    pub valid_from_field_name: &'static str,
    /// Signed issue timestamp.
    pub encrypted_valid_from: String,
}

/// Issues and checks honeypot inputs.
#[derive(Debug, Clone)]
pub struct Honeypot {
    signer: Signer,
}

impl Honeypot {
    /// Build with the honeypot secret.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::NoSecrets`] for an empty secret.
    pub fn new(secret: &str) -> Result<Self, SigningError> {
        Ok(Self {
            signer: Signer::new(secret)?,
        })
    }

    /// Props for a form issued at `now`.
    ///
    /// # Errors
    ///
    /// Propagates signing failures.
    pub fn input_props(&self, now: DateTime<Utc>) -> Result<HoneypotInputProps, SigningError> {
        Ok(HoneypotInputProps {
            name_field_name: NAME_FIELD,
            valid_from_field_name: VALID_FROM_FIELD,
            encrypted_valid_from: self.signer.sign(&now.timestamp_millis().to_string())?,
        })
    }

    /// Check a submitted form at time `now`.
    ///
    /// # Errors
    ///
    /// Returns the first [`HoneypotError`] encountered.
    pub fn check(
        &self,
        form: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<(), HoneypotError> {
        let trap = form.get(NAME_FIELD).ok_or(HoneypotError::MissingInput)?;
        if !trap.is_empty() {
            return Err(HoneypotError::InputNotEmpty);
        }

        let signed = form
            .get(VALID_FROM_FIELD)
            .ok_or(HoneypotError::MissingValidFrom)?;
        let issued_at = self
            .signer
            .unsign(signed)
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
            .ok_or(HoneypotError::InvalidValidFrom)?;
        if issued_at > now {
            return Err(HoneypotError::FutureValidFrom);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn submitted(props: &HoneypotInputProps, trap: &str) -> HashMap<String, String> {
        HashMap::from([
            (NAME_FIELD.to_owned(), trap.to_owned()),
            (VALID_FROM_FIELD.to_owned(), props.encrypted_valid_from.clone()),
        ])
    }

    #[test]
    fn untouched_form_passes() {
        let honeypot = Honeypot::new("h").unwrap();
        let now = Utc::now();
        let props = honeypot.input_props(now).unwrap();
        assert_eq!(honeypot.check(&submitted(&props, ""), now), Ok(()));
    }

    #[test]
    fn filled_trap_is_rejected() {
        let honeypot = Honeypot::new("h").unwrap();
        let now = Utc::now();
        let props = honeypot.input_props(now).unwrap();
        assert_eq!(
            honeypot.check(&submitted(&props, "bot"), now),
            Err(HoneypotError::InputNotEmpty)
        );
    }

    #[test]
    fn missing_fields_are_rejected() {
        let honeypot = Honeypot::new("h").unwrap();
        let now = Utc::now();
        assert_eq!(
            honeypot.check(&HashMap::new(), now),
            Err(HoneypotError::MissingInput)
        );
        let only_trap = HashMap::from([(NAME_FIELD.to_owned(), String::new())]);
        assert_eq!(
            honeypot.check(&only_trap, now),
            Err(HoneypotError::MissingValidFrom)
        );
    }

    #[test]
    fn forged_or_future_timestamps_are_rejected() {
        let honeypot = Honeypot::new("h").unwrap();
        let other = Honeypot::new("x").unwrap();
        let now = Utc::now();

        let forged = other.input_props(now).unwrap();
        assert_eq!(
            honeypot.check(&submitted(&forged, ""), now),
            Err(HoneypotError::InvalidValidFrom)
        );

        let future = honeypot.input_props(now + TimeDelta::minutes(5)).unwrap();
        assert_eq!(
            honeypot.check(&submitted(&future, ""), now),
            Err(HoneypotError::FutureValidFrom)
        );
    }
}
