//! HGVS change grammar
//!
//! Only the change subset shared with the free-text grammars is recognized.
//! `n.` and `r.` expressions are not classified.

use crate::classify::variant_from_payload;
use crate::classify::types::ClassifiedVariant;
use crate::token::{CoordinateType, HgvsToken};
use crate::tokenize::free_text::{parse_change, strip_coordinate_prefix, MoleculeContext};

/// Interpret the change part of an HGVS token
pub fn classify_hgvs_change(token: &HgvsToken) -> Option<ClassifiedVariant> {
    let (context, change) = match token.coordinate_type {
        CoordinateType::Protein => (
            MoleculeContext::Protein,
            strip_coordinate_prefix(&token.change, MoleculeContext::Protein)?,
        ),
        CoordinateType::Coding => (MoleculeContext::Cdna, token.change.as_str()),
        CoordinateType::Genomic => (MoleculeContext::Genomic, token.change.as_str()),
        CoordinateType::NonCoding | CoordinateType::Rna => return None,
    };

    let payload = parse_change(context, change)?;
    variant_from_payload(&payload)
}
