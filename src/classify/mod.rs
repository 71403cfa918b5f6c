//! Classifier
//!
//! Maps an ordered token sequence to exactly one [`Classification`]. The
//! grammar lives in [`grammar`]; its uniqueness is checked when a
//! [`Classifier`] is built.

pub mod ambiguous;
pub mod gnomad;
pub mod grammar;
pub mod hgvs;
pub mod types;

use std::collections::HashMap;

use crate::error::FerroError;
use crate::token::{Token, TokenPayload, TokenType};
use ambiguous::AmbiguousRangeResolver;
use grammar::{index_rules, RuleTarget, GRAMMAR};

pub use types::{
    AmbiguousResolution, AmbiguousType, AmbiguousVariant, Classification, ClassificationType,
    ClassifiedVariant, Nomenclature, NucleotideSubstitution, SequenceOntology,
};

/// Convert a change token payload into a classified variant.
///
/// Returns `None` for tokens that do not describe a change, and for
/// substitutions whose lengths give no sequence-ontology subtype.
pub fn variant_from_payload(payload: &TokenPayload) -> Option<ClassifiedVariant> {
    let nucleotide = |s: &crate::token::Substitution| {
        SequenceOntology::for_substitution(&s.ref_, &s.alt).map(|so_id| NucleotideSubstitution {
            pos: s.pos,
            ref_: s.ref_.clone(),
            alt: s.alt.clone(),
            so_id,
        })
    };

    Some(match payload {
        TokenPayload::ProteinSubstitution(s) => ClassifiedVariant::ProteinSubstitution(s.clone()),
        TokenPayload::ProteinStopGain(s) => ClassifiedVariant::ProteinStopGain(s.clone()),
        TokenPayload::ProteinReferenceAgree { pos, ref_ } => ClassifiedVariant::ProteinReferenceAgree {
            pos: *pos,
            ref_: ref_.clone(),
        },
        TokenPayload::ProteinDeletion(d) => ClassifiedVariant::ProteinDeletion(d.clone()),
        TokenPayload::ProteinDelins(d) => ClassifiedVariant::ProteinDelins(d.clone()),
        TokenPayload::ProteinInsertion(i) => ClassifiedVariant::ProteinInsertion(i.clone()),
        TokenPayload::CdnaSubstitution(s) => ClassifiedVariant::CdnaSubstitution(nucleotide(s)?),
        TokenPayload::CdnaReferenceAgree { pos } => ClassifiedVariant::CdnaReferenceAgree { pos: *pos },
        TokenPayload::CdnaDeletion(d) => ClassifiedVariant::CdnaDeletion(d.clone()),
        TokenPayload::CdnaDelins(d) => ClassifiedVariant::CdnaDelins(d.clone()),
        TokenPayload::CdnaInsertion(i) => ClassifiedVariant::CdnaInsertion(i.clone()),
        TokenPayload::GenomicSubstitution(s) => {
            ClassifiedVariant::GenomicSubstitution(nucleotide(s)?)
        }
        TokenPayload::GenomicReferenceAgree { pos } => {
            ClassifiedVariant::GenomicReferenceAgree { pos: *pos }
        }
        TokenPayload::GenomicDeletion(d) => ClassifiedVariant::GenomicDeletion(d.clone()),
        TokenPayload::GenomicDelins(d) => ClassifiedVariant::GenomicDelins(d.clone()),
        TokenPayload::GenomicInsertion(i) => ClassifiedVariant::GenomicInsertion(i.clone()),
        TokenPayload::GenomicDuplication(d) => ClassifiedVariant::GenomicDuplication(d.clone()),
        TokenPayload::GenomicDuplicationAmbiguous(range) => {
            ClassifiedVariant::GenomicDuplicationAmbiguous(AmbiguousVariant {
                range: range.clone(),
                resolution: AmbiguousRangeResolver::resolve(range),
            })
        }
        TokenPayload::GenomicDeletionAmbiguous(range) => {
            ClassifiedVariant::GenomicDeletionAmbiguous(AmbiguousVariant {
                range: range.clone(),
                resolution: AmbiguousRangeResolver::resolve(range),
            })
        }
        TokenPayload::Amplification => ClassifiedVariant::Amplification,
        TokenPayload::Gene { .. }
        | TokenPayload::Hgvs(_)
        | TokenPayload::GnomadVcf(_)
        | TokenPayload::Unknown => return None,
    })
}

/// Grammar-driven classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: HashMap<Vec<TokenType>, RuleTarget>,
}

impl Classifier {
    /// Build the classifier, verifying that no two rules share a sequence
    pub fn new() -> Result<Self, FerroError> {
        Ok(Self {
            rules: index_rules(GRAMMAR)?,
        })
    }

    /// Classify a token sequence. `None` if no rule matches exactly.
    pub fn classify(&self, tokens: &[Token]) -> Option<Classification> {
        let sequence: Vec<TokenType> = tokens.iter().map(|t| t.token_type()).collect();
        let target = self.rules.get(&sequence)?;
        tracing::debug!(?sequence, ?target, "matched grammar rule");

        match target {
            RuleTarget::Hgvs => {
                let TokenPayload::Hgvs(hgvs_token) = &tokens.first()?.payload else {
                    return None;
                };
                Some(Classification {
                    matching_tokens: tokens.to_vec(),
                    nomenclature: Nomenclature::Hgvs,
                    gene: None,
                    accession: Some(hgvs_token.accession.clone()),
                    variant: hgvs::classify_hgvs_change(hgvs_token)?,
                })
            }
            RuleTarget::GnomadVcf => {
                let TokenPayload::GnomadVcf(vcf) = &tokens.first()?.payload else {
                    return None;
                };
                Some(Classification {
                    matching_tokens: tokens.to_vec(),
                    nomenclature: Nomenclature::GnomadVcf,
                    gene: None,
                    accession: None,
                    variant: gnomad::classify_gnomad_vcf(vcf)?,
                })
            }
            RuleTarget::FreeText(expected) => {
                let gene = tokens.first()?.gene_symbol()?.to_string();
                let variant = variant_from_payload(&tokens.last()?.payload)?;
                debug_assert_eq!(variant.classification_type(), *expected);
                Some(Classification {
                    matching_tokens: tokens.to_vec(),
                    nomenclature: Nomenclature::FreeText,
                    gene: Some(gene),
                    accession: None,
                    variant,
                })
            }
        }
    }
}
