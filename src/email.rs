//! A normalized email address used to identify users.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An email address, trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// Surrounding whitespace is removed and the address is lower-cased, so
    /// `" Alice@Example.com "` and `"alice@example.com"` are the same user.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidEmail] if `raw_email` is
    /// empty or has no `@`.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim().to_lowercase();

        // TODO: Use proper regex/email validation.
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidEmail(raw_email.to_owned()));
        }

        Ok(Self(email))
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is already normalized, e.g.
    /// because it was read back from the database.
    pub fn new_unchecked(raw_email: String) -> Self {
        Self(raw_email)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
