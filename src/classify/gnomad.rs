//! gnomAD VCF classification by diffing `ref` against `alt`
//!
//! VCF positions are 1-based and anchor the first base of `ref`.

use crate::classify::types::{ClassifiedVariant, NucleotideSubstitution, SequenceOntology};
use crate::token::{Deletion, Delins, GnomadVcfToken, Insertion};

/// Last position covered by `len` bases starting at `pos`, or `None` for one base
fn span_end(pos: u64, len: usize) -> Option<Option<u64>> {
    if len > 1 {
        pos.checked_add(len as u64 - 1).map(Some)
    } else {
        Some(None)
    }
}

/// Classify a gnomAD VCF token.
///
/// Returns `None` when the variant would extend past the largest
/// representable position.
pub fn classify_gnomad_vcf(token: &GnomadVcfToken) -> Option<ClassifiedVariant> {
    let (pos, ref_, alt) = (token.pos, token.ref_.as_str(), token.alt.as_str());

    if ref_.len() == alt.len() {
        if ref_ == alt {
            return Some(ClassifiedVariant::GenomicReferenceAgree { pos });
        }
        // the last reference base must still be addressable
        span_end(pos, ref_.len())?;
        let so_id = SequenceOntology::for_substitution(ref_, alt).unwrap_or(SequenceOntology::Mnv);
        return Some(ClassifiedVariant::GenomicSubstitution(NucleotideSubstitution {
            pos,
            ref_: ref_.to_string(),
            alt: alt.to_string(),
            so_id,
        }));
    }

    if ref_.len() == 1 && alt.starts_with(ref_) {
        return Some(ClassifiedVariant::GenomicInsertion(Insertion {
            pos0: pos,
            pos1: pos.checked_add(1)?,
            inserted_sequence: alt[1..].to_string(),
        }));
    }

    if alt.len() < ref_.len() && ref_.starts_with(alt) {
        let pos0 = pos.checked_add(alt.len() as u64)?;
        let end = pos.checked_add(ref_.len() as u64 - 1)?;
        return Some(ClassifiedVariant::GenomicDeletion(Deletion {
            pos0,
            pos1: (end > pos0).then_some(end),
            deleted_sequence: Some(ref_[alt.len()..].to_string()),
        }));
    }

    Some(ClassifiedVariant::GenomicDelins(Delins {
        pos0: pos,
        pos1: span_end(pos, ref_.len())?,
        inserted_sequence: alt.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vcf(pos: u64, ref_: &str, alt: &str) -> GnomadVcfToken {
        GnomadVcfToken {
            chromosome: "chr7".to_string(),
            pos,
            ref_: ref_.to_string(),
            alt: alt.to_string(),
        }
    }

    #[test]
    fn test_reference_agree() {
        assert_eq!(
            classify_gnomad_vcf(&vcf(100, "A", "A")),
            Some(ClassifiedVariant::GenomicReferenceAgree { pos: 100 })
        );
    }

    #[test]
    fn test_substitution_subtypes() {
        match classify_gnomad_vcf(&vcf(100, "AC", "TG")) {
            Some(ClassifiedVariant::GenomicSubstitution(s)) => assert_eq!(s.so_id, SequenceOntology::Mnv),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_insertion() {
        assert_eq!(
            classify_gnomad_vcf(&vcf(100, "A", "ATT")),
            Some(ClassifiedVariant::GenomicInsertion(Insertion {
                pos0: 100,
                pos1: 101,
                inserted_sequence: "TT".to_string(),
            }))
        );
    }

    #[test]
    fn test_deletion() {
        assert_eq!(
            classify_gnomad_vcf(&vcf(100, "ACGT", "A")),
            Some(ClassifiedVariant::GenomicDeletion(Deletion {
                pos0: 101,
                pos1: Some(103),
                deleted_sequence: Some("CGT".to_string()),
            }))
        );
        // single-base deletion has no second position
        assert_eq!(
            classify_gnomad_vcf(&vcf(100, "AC", "A")),
            Some(ClassifiedVariant::GenomicDeletion(Deletion {
                pos0: 101,
                pos1: None,
                deleted_sequence: Some("C".to_string()),
            }))
        );
    }

    #[test]
    fn test_delins() {
        assert_eq!(
            classify_gnomad_vcf(&vcf(100, "ACG", "TT")),
            Some(ClassifiedVariant::GenomicDelins(Delins {
                pos0: 100,
                pos1: Some(102),
                inserted_sequence: "TT".to_string(),
            }))
        );
    }

    #[test]
    fn test_positions_past_the_end_do_not_classify() {
        assert_eq!(classify_gnomad_vcf(&vcf(u64::MAX, "A", "AT")), None);
        assert_eq!(classify_gnomad_vcf(&vcf(u64::MAX, "AC", "A")), None);
        assert_eq!(classify_gnomad_vcf(&vcf(u64::MAX, "AC", "TG")), None);
        assert_eq!(classify_gnomad_vcf(&vcf(u64::MAX, "ACG", "T")), None);
        // a single base at the last position is still addressable
        assert!(classify_gnomad_vcf(&vcf(u64::MAX, "A", "T")).is_some());
    }
}
