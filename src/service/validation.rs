//! Input validation for web service requests
//!
//! Query strings reach the tokenizer verbatim, so they are bounded and
//! restricted to printable ASCII before any work is done.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum allowed length for a query or HGVS expression
const MAX_QUERY_LENGTH: usize = 1000;

/// Maximum allowed length for an accession
const MAX_ACCESSION_LENGTH: usize = 64;

/// Versioned RefSeq/Ensembl style accession or a refget identifier
static ACCESSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{1,6}_?\d+(\.\d+)?|(ga4gh:)?SQ\.[A-Za-z0-9_-]{32})$")
        .expect("valid accession pattern")
});

/// Validation errors for user input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    /// Input string is empty
    Empty,
    /// Input string is too long
    TooLong { max: usize, actual: usize },
    /// Input contains non-ASCII characters
    NonAscii,
    /// Input contains control characters
    ControlCharacters,
    /// Input is not an accession
    InvalidAccession,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Empty => write!(f, "Input cannot be empty"),
            ValidationError::TooLong { max, actual } => {
                write!(f, "Input too long: {} characters (max: {})", actual, max)
            }
            ValidationError::NonAscii => write!(f, "Input must contain only ASCII characters"),
            ValidationError::ControlCharacters => {
                write!(f, "Input must not contain control characters")
            }
            ValidationError::InvalidAccession => write!(f, "Input is not a valid accession"),
        }
    }
}

impl std::error::Error for ValidationError {}

fn validate_text(input: &str, max: usize) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    if input.len() > max {
        return Err(ValidationError::TooLong {
            max,
            actual: input.len(),
        });
    }
    if !input.is_ascii() {
        return Err(ValidationError::NonAscii);
    }
    if input.chars().any(|c| c.is_ascii_control()) {
        return Err(ValidationError::ControlCharacters);
    }
    Ok(())
}

/// Validate a free text, HGVS or gnomAD VCF query
pub fn validate_query(input: &str) -> Result<(), ValidationError> {
    validate_text(input, MAX_QUERY_LENGTH)
}

/// Validate an accession parameter
pub fn validate_accession(input: &str) -> Result<(), ValidationError> {
    validate_text(input, MAX_ACCESSION_LENGTH)?;
    if !ACCESSION_PATTERN.is_match(input) {
        return Err(ValidationError::InvalidAccession);
    }
    Ok(())
}
