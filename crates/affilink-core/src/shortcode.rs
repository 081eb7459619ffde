use crate::error::ShortCodeError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated short code identifying a link on the redirect path.
///
/// Short codes must be 3-32 characters long and contain only
/// alphanumeric characters, hyphens, or underscores. Once assigned to a
/// link a code never changes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 32;

/// Path prefix under which short codes are served.
pub const REDIRECT_PREFIX: &str = "/go";

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    ///
    /// Valid codes are 3-32 characters and contain only `[a-zA-Z0-9_-]`.
    pub fn new(code: impl Into<String>) -> Result<Self, ShortCodeError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes read back from the store or produced by the
    /// link generator.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the relative redirect path, e.g. `/go/matcha-lz`.
    pub fn short_path(&self) -> String {
        format!("{}/{}", REDIRECT_PREFIX, self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> Result<(), ShortCodeError> {
        if code.len() < MIN_LENGTH || code.len() > MAX_LENGTH {
            return Err(ShortCodeError::Invalid(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ShortCodeError::Invalid(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl TryFrom<String> for ShortCode {
    type Error = ShortCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
