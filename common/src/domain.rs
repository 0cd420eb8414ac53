//! # Domain Model
//!
//! A [`Domain`] is the unit of work of one pipeline run. It is parsed once from user
//! input and never changes afterwards, so it is safe to splice into file names and tool
//! arguments.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Longest textual form of a DNS name.
pub const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain name is empty")]
    Empty,
    #[error("name is longer than {MAX_HOSTNAME_LEN} characters")]
    TooLong,
    #[error("invalid label '{0}'")]
    InvalidLabel(String),
    #[error("'{0}' is not a fully qualified domain name")]
    NotQualified(String),
}

/// A root DNS name such as `example.com`, lowercased and without a trailing dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Domain {
    type Err = DomainError;

    /// Parses a domain name.
    ///
    /// Surrounding whitespace and a single trailing dot are ignored, the name is
    /// lowercased and must contain at least two labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        let lower = trimmed.to_ascii_lowercase();

        validate_hostname(&lower)?;

        if !lower.contains('.') {
            return Err(DomainError::NotQualified(lower));
        }

        Ok(Domain(lower))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks that `name` is a plain DNS hostname.
///
/// Labels may hold ASCII letters, digits, `-` and `_` (service labels such as
/// `_dmarc`), must not be empty and must not start or end with a hyphen. Anything else,
/// including whitespace, control characters, ports, paths and user info, is rejected.
pub fn validate_hostname(name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::Empty);
    }
    if name.len() > MAX_HOSTNAME_LEN {
        return Err(DomainError::TooLong);
    }

    for label in name.split('.') {
        if !is_valid_label(label) {
            return Err(DomainError::InvalidLabel(label.escape_debug().to_string()));
        }
    }
    Ok(())
}

pub fn is_valid_hostname(name: &str) -> bool {
    validate_hostname(name).is_ok()
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
