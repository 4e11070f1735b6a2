use crate::error::NfeError;

/// IBGE codes of the 27 federal units.
pub const UF_CODES: [&str; 27] = [
    "11", "12", "13", "14", "15", "16", "17", // Norte
    "21", "22", "23", "24", "25", "26", "27", "28", "29", // Nordeste
    "31", "32", "33", "35", // Sudeste
    "41", "42", "43", // Sul
    "50", "51", "52", "53", // Centro-Oeste
];

/// Check that `raw` is a numeric UF code and return it trimmed.
///
/// Codes outside [`UF_CODES`] (91 for Ambiente Nacional, for instance) are
/// accepted; only the digit form is enforced.
pub fn validate_uf(raw: &str) -> Result<String, NfeError> {
    let uf = raw.trim();
    if !uf.is_empty() && uf.chars().all(|c| c.is_ascii_digit()) {
        Ok(uf.to_string())
    } else {
        Err(NfeError::InvalidUf(raw.to_string()))
    }
}
