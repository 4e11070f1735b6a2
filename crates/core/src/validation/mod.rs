mod rules;

pub use rules::{validate_uf, UF_CODES};

use crate::error::NfeError;
use crate::models::AccessKey;

/// Number of digits in an NF-e access key.
pub const ACCESS_KEY_LEN: usize = 44;

/// Normalize and validate a raw access key.
///
/// Every non-digit character is stripped (spaces, dots, dashes from
/// formatted DANFE keys) and the remainder must be exactly 44 digits. The
/// check digit is not verified.
pub fn validate_access_key(raw: &str) -> Result<AccessKey, NfeError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != ACCESS_KEY_LEN {
        return Err(NfeError::InvalidAccessKey {
            digits: digits.len(),
        });
    }
    Ok(AccessKey::from_digits(digits))
}
