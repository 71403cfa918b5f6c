//! GA4GH VRS objects, computed identifiers and allele normalization

pub mod digest;
pub mod models;
pub mod normalize;

pub use digest::{identify, sequence_identifier, sha512t24u};
pub use models::{
    Allele, Coordinate, CopyChange, CopyNumberChange, CopyNumberCount, LiteralSequenceExpression,
    SequenceLocation, SequenceReference, Variation,
};
pub use normalize::FullyJustifiedNormalizer;
