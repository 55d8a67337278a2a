//! Key identifier validation

use thiserror::Error;

/// Errors that can occur while validating a key identifier
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeyIdValidationError {
    #[error("keyId cannot be empty")]
    Empty,

    #[error("keyId exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("keyId contains invalid character: '{0}'. Only alphanumeric characters, '_' and '-' are allowed")]
    InvalidCharacter(char),
}

const MAX_KEY_ID_LENGTH: usize = 255;

/// Validate a key identifier
///
/// Rules:
/// - Cannot be empty
/// - Maximum 255 characters
/// - Only ASCII alphanumeric characters, underscores and hyphens
///
/// The id is embedded as one segment of a capability string, so separators
/// and wildcard characters are rejected here.
pub fn validate_key_id(id: &str) -> Result<(), KeyIdValidationError> {
    if id.is_empty() {
        return Err(KeyIdValidationError::Empty);
    }

    if id.len() > MAX_KEY_ID_LENGTH {
        return Err(KeyIdValidationError::TooLong(MAX_KEY_ID_LENGTH));
    }

    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(KeyIdValidationError::InvalidCharacter(c));
    }

    Ok(())
}
