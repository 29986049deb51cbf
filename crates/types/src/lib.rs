//! # CRS Types
//!
//! Shared validated vocabulary types for the CRS workspace.
//!
//! These types exist so that "a string that has already been validated" has a
//! distinct type from "a string that arrived over the wire". Construction is
//! the only place validation happens; everything downstream can rely on the
//! invariant without re-checking.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace.
    #[error("text cannot be empty")]
    Empty,
    /// The input text exceeded the maximum permitted length.
    #[error("text exceeds maximum length of {0} characters")]
    TooLong(usize),
    /// The input contained characters outside the permitted set.
    #[error("text contains invalid characters")]
    InvalidCharacters,
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed of leading and trailing whitespace during
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed; if the trimmed result is empty, an error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A medical record number, the per-tenant natural key of a patient record.
///
/// MRNs are trimmed, uppercased, bounded in length, and restricted to a
/// conservative character set so they are safe to embed in URLs and log lines.
/// Uniqueness per tenant is enforced by the persistence layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mrn(String);

impl Mrn {
    const MAX_LEN: usize = 64;

    /// Parses an MRN from caller-supplied input.
    ///
    /// # Errors
    ///
    /// Returns a `TextError` if the input is empty, too long, or contains
    /// characters outside `[A-Z0-9._-]` (input is uppercased first).
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(TextError::TooLong(Self::MAX_LEN));
        }

        let normalised = trimmed.to_ascii_uppercase();
        let ok = normalised
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
        if !ok {
            return Err(TextError::InvalidCharacters);
        }

        Ok(Self(normalised))
    }

    /// Returns the canonical (uppercased) MRN as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mrn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Mrn {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Mrn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Mrn::parse(&s).map_err(serde::de::Error::custom)
    }
}
