//! Error types for ferro-vrs
//!
//! Errors carry a numeric [`ErrorCode`] grouped by pipeline stage so that
//! callers (and the web service) can categorize failures without string
//! matching. Domain failures are normally turned into warning strings at the
//! query boundary; see [`crate::query`].

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Tokenize/classify errors (E1xxx)
    /// No matcher accepted an input term
    Untokenizable = 1001,
    /// Token sequence matched no grammar rule
    Unclassifiable = 1002,
    /// Two grammar rules declare the same token sequence
    AmbiguousGrammar = 1003,
    /// Invalid amino acid code
    InvalidAminoAcid = 1004,

    // Reference/collaborator errors (E2xxx)
    /// Accession or identifier not found
    ReferenceNotFound = 2001,
    /// Sequence not available over the requested span
    SequenceNotFound = 2002,
    /// Collaborator call exceeded its deadline
    Timeout = 2003,
    /// Collaborator returned an error
    Collaborator = 2004,

    // Validation errors (E3xxx)
    /// Position out of bounds
    PositionOutOfBounds = 3001,
    /// Reference sequence mismatch
    ReferenceMismatch = 3002,
    /// Positions not ordered 5' to 3'
    InvalidRange = 3003,

    // Translation errors (E4xxx)
    /// Unsupported classification or ambiguous shape
    UnsupportedVariant = 4001,
    /// Allele normalization failed
    NormalizationFailed = 4002,
    /// Required mode parameter missing
    MissingParameter = 4003,

    // Resolution errors (E5xxx)
    /// Accession/assembly resolution failed
    ResolutionFailed = 5001,
    /// Position could not be lifted over
    LiftoverFailed = 5002,
    /// Coordinate conversion failed
    ConversionFailed = 5003,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::Untokenizable => "unable to tokenize input",
            ErrorCode::Unclassifiable => "no classification for token sequence",
            ErrorCode::AmbiguousGrammar => "duplicate grammar rule",
            ErrorCode::InvalidAminoAcid => "invalid amino acid",
            ErrorCode::ReferenceNotFound => "reference not found",
            ErrorCode::SequenceNotFound => "sequence not available",
            ErrorCode::Timeout => "collaborator timed out",
            ErrorCode::Collaborator => "collaborator error",
            ErrorCode::PositionOutOfBounds => "position out of bounds",
            ErrorCode::ReferenceMismatch => "reference sequence mismatch",
            ErrorCode::InvalidRange => "invalid coordinate range",
            ErrorCode::UnsupportedVariant => "unsupported variant",
            ErrorCode::NormalizationFailed => "allele normalization failed",
            ErrorCode::MissingParameter => "missing required parameter",
            ErrorCode::ResolutionFailed => "accession resolution failed",
            ErrorCode::LiftoverFailed => "liftover failed",
            ErrorCode::ConversionFailed => "coordinate conversion failed",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
            ErrorCode::ConfigError => "configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for ferro-vrs operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FerroError {
    /// The classifier grammar declares the same token sequence twice
    #[error("Grammar rules {first} and {second} both declare {sequence}")]
    AmbiguousGrammar {
        first: String,
        second: String,
        sequence: String,
    },

    /// Amino acid code could not be interpreted
    #[error("Invalid amino acid: {code}")]
    InvalidAminoAcid { code: String },

    /// Reference sequence, transcript or identifier not found
    #[error("Reference not found: {id}")]
    ReferenceNotFound { id: String },

    /// Sequence not available over the requested span
    #[error("Sequence not available for {accession}:{start}-{end}")]
    SequenceNotFound {
        accession: String,
        start: u64,
        end: u64,
    },

    /// Collaborator call exceeded its deadline
    #[error("{operation} timed out after {millis} ms")]
    Timeout { operation: String, millis: u64 },

    /// Collaborator failed for a reason of its own
    #[error("{service}: {msg}")]
    Collaborator { service: String, msg: String },

    /// Position not present on the accession
    #[error("{msg}")]
    PositionOutOfBounds { msg: String },

    /// Reference sequence mismatch
    #[error("Expected to find {expected} at positions {location} but found {found}")]
    ReferenceMismatch {
        location: String,
        expected: String,
        found: String,
    },

    /// Invalid coordinates provided
    #[error("Invalid coordinates: {msg}")]
    InvalidCoordinates { msg: String },

    /// Unsupported variant or ambiguous shape
    #[error("{variant_type} is not yet supported")]
    UnsupportedVariant { variant_type: String },

    /// Allele normalization failed
    #[error("Unable to normalize allele: {msg}")]
    Normalization { msg: String },

    /// Required parameter missing for the requested mode
    #[error("{parameter} must be provided for {context}")]
    MissingParameter { parameter: String, context: String },

    /// Accession or assembly could not be resolved
    #[error("{msg}")]
    Resolution { msg: String },

    /// Position could not be lifted to the target assembly
    #[error("Unable to liftover: {chromosome} with pos {pos}")]
    Liftover { chromosome: String, pos: u64 },

    /// Coordinate conversion error
    #[error("Coordinate conversion error: {msg}")]
    ConversionError { msg: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON parsing error
    #[error("JSON error: {msg}")]
    Json { msg: String },

    /// Configuration error
    #[error("Configuration error: {msg}")]
    Config { msg: String },
}

impl FerroError {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        FerroError::Resolution { msg: msg.into() }
    }

    /// Create a collaborator error
    pub fn collaborator(service: impl Into<String>, msg: impl fmt::Display) -> Self {
        FerroError::Collaborator {
            service: service.into(),
            msg: msg.to_string(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            FerroError::AmbiguousGrammar { .. } => ErrorCode::AmbiguousGrammar,
            FerroError::InvalidAminoAcid { .. } => ErrorCode::InvalidAminoAcid,
            FerroError::ReferenceNotFound { .. } => ErrorCode::ReferenceNotFound,
            FerroError::SequenceNotFound { .. } => ErrorCode::SequenceNotFound,
            FerroError::Timeout { .. } => ErrorCode::Timeout,
            FerroError::Collaborator { .. } => ErrorCode::Collaborator,
            FerroError::PositionOutOfBounds { .. } => ErrorCode::PositionOutOfBounds,
            FerroError::ReferenceMismatch { .. } => ErrorCode::ReferenceMismatch,
            FerroError::InvalidCoordinates { .. } => ErrorCode::InvalidRange,
            FerroError::UnsupportedVariant { .. } => ErrorCode::UnsupportedVariant,
            FerroError::Normalization { .. } => ErrorCode::NormalizationFailed,
            FerroError::MissingParameter { .. } => ErrorCode::MissingParameter,
            FerroError::Resolution { .. } => ErrorCode::ResolutionFailed,
            FerroError::Liftover { .. } => ErrorCode::LiftoverFailed,
            FerroError::ConversionError { .. } => ErrorCode::ConversionFailed,
            FerroError::Io { .. } => ErrorCode::IoError,
            FerroError::Json { .. } => ErrorCode::JsonError,
            FerroError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// True for the ResolutionError class: accession/assembly lookup and
    /// liftover failures that are converted to warnings at the query boundary.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            FerroError::Resolution { .. }
                | FerroError::Liftover { .. }
                | FerroError::ReferenceNotFound { .. }
        )
    }

    /// Message prefixed with the error code, e.g. `[E5002] Unable to liftover: ...`
    pub fn detailed_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}

impl From<std::io::Error> for FerroError {
    fn from(err: std::io::Error) -> Self {
        FerroError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FerroError {
    fn from(err: serde_json::Error) -> Self {
        FerroError::Json {
            msg: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FerroError {
    fn from(err: toml::de::Error) -> Self {
        FerroError::Config {
            msg: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for FerroError {
    fn from(err: toml::ser::Error) -> Self {
        FerroError::Config {
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::Untokenizable.as_str(), "E1001");
        assert_eq!(ErrorCode::LiftoverFailed.as_str(), "E5002");
        assert_eq!(ErrorCode::IoError.as_str(), "E9001");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::ReferenceMismatch), "E3002");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::Timeout.description(), "collaborator timed out");
        assert_eq!(
            ErrorCode::MissingParameter.description(),
            "missing required parameter"
        );
    }

    #[test]
    fn test_unsupported_variant_message() {
        let err = FerroError::UnsupportedVariant {
            variant_type: "(#_?)_(?_#)".to_string(),
        };
        assert_eq!(err.to_string(), "(#_?)_(?_#) is not yet supported");
        assert_eq!(err.code(), ErrorCode::UnsupportedVariant);
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = FerroError::MissingParameter {
            parameter: "baseline_copies".to_string(),
            context: "Copy Number Count Variation".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "baseline_copies must be provided for Copy Number Count Variation"
        );
    }

    #[test]
    fn test_liftover_message() {
        let err = FerroError::Liftover {
            chromosome: "chr7".to_string(),
            pos: 140453136,
        };
        assert_eq!(err.to_string(), "Unable to liftover: chr7 with pos 140453136");
        assert!(err.is_resolution());
        assert_eq!(
            err.detailed_message(),
            "[E5002] Unable to liftover: chr7 with pos 140453136"
        );
    }

    #[test]
    fn test_timeout_is_not_resolution() {
        let err = FerroError::Timeout {
            operation: "get_cds_start_end".to_string(),
            millis: 5000,
        };
        assert!(!err.is_resolution());
        assert_eq!(err.to_string(), "get_cds_start_end timed out after 5000 ms");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FerroError = io.into();
        assert_eq!(err.code(), ErrorCode::IoError);
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FerroError = json_err.into();
        assert!(matches!(err, FerroError::Json { .. }));
    }
}
