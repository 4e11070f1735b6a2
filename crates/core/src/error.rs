use thiserror::Error;

/// Errors raised while validating input or handling NF-e XML.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NfeError {
    /// The access key did not contain exactly 44 digits after stripping.
    #[error("access key must contain exactly 44 digits, got {digits}")]
    InvalidAccessKey { digits: usize },

    /// Unknown IBGE federal unit code.
    #[error("invalid UF code: {0:?}")]
    InvalidUf(String),

    /// Environment flag other than `1` (production) or `2` (homologation).
    #[error("invalid tpAmb {0:?}: expected 1 (production) or 2 (homologation)")]
    InvalidAmbiente(String),

    /// XML generation failed.
    #[error("XML write error: {0}")]
    Xml(String),

    /// The response is not well-formed XML.
    #[error("malformed XML: {0}")]
    Parse(#[from] roxmltree::Error),
}
