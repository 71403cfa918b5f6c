//! Validator
//!
//! Checks a [`Classification`] against every candidate accession and reports
//! one [`ValidationResult`] per accession. Failures are collected as
//! messages on the result rather than returned as errors; the
//! classification as a whole fails only when no accession validates.
//!
//! # Checks
//!
//! | Family | Check |
//! |--------|-------|
//! | all | known positions listed 5' to 3' |
//! | protein | asserted residues match the protein sequence |
//! | cDNA | CDS start exists; positions (offset by CDS start) exist or match |
//! | genomic | positions exist or match; gnomAD REF matches; gene bounds |

pub mod accessions;
pub mod checks;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::classify::ambiguous::AmbiguousRangeResolver;
use crate::classify::{
    AmbiguousResolution, Classification, ClassificationType, ClassifiedVariant,
};
use crate::context::QueryContext;
use crate::reference::AnnotationLayer;
use checks::{offset_position, SequenceChecks};

/// Outcome of validating a classification on one accession
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `None` for results that do not depend on an accession
    pub accession: Option<String>,
    /// 0-based CDS start, set for valid cDNA results
    pub cds_start: Option<u64>,
    pub classification: Classification,
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn invalid(classification: &Classification, error: String) -> Self {
        Self {
            accession: None,
            cds_start: None,
            classification: classification.clone(),
            is_valid: false,
            errors: vec![error],
        }
    }
}

/// Validation results split by outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub valid_results: Vec<ValidationResult>,
    pub invalid_results: Vec<ValidationResult>,
    pub warnings: Vec<String>,
}

impl ValidationSummary {
    /// Partition results; warns when none is valid
    pub fn from_results(
        classification_type: ClassificationType,
        results: Vec<ValidationResult>,
    ) -> Self {
        let (valid_results, invalid_results): (Vec<_>, Vec<_>) =
            results.into_iter().partition(|r| r.is_valid);
        let warnings = if valid_results.is_empty() {
            vec![format!(
                "Unable to find valid result for classification: {}",
                classification_type
            )]
        } else {
            Vec::new()
        };
        Self {
            valid_results,
            invalid_results,
            warnings,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.valid_results.is_empty()
    }
}

/// Validates classifications against the reference collaborators
pub struct Validator<'a> {
    ctx: &'a QueryContext,
}

impl<'a> Validator<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    /// Validate and summarize
    pub async fn summarize(&self, classification: &Classification) -> ValidationSummary {
        let results = self.validate(classification).await;
        ValidationSummary::from_results(classification.classification_type(), results)
    }

    /// One result per candidate accession, in candidate order.
    ///
    /// Ordering, unsupported-shape and candidate-resolution failures yield a
    /// single accession-less invalid result.
    pub async fn validate(&self, classification: &Classification) -> Vec<ValidationResult> {
        let variant = &classification.variant;

        if matches!(variant, ClassifiedVariant::Amplification) {
            return vec![ValidationResult {
                accession: None,
                cds_start: None,
                classification: classification.clone(),
                is_valid: true,
                errors: Vec::new(),
            }];
        }

        if let Some(error) = checks::five_prime_to_three_prime(&variant.ordered_positions()) {
            return vec![ValidationResult::invalid(classification, error)];
        }

        if let Some(amb) = variant.ambiguous() {
            if let AmbiguousResolution::Unsupported { .. } = amb.resolution {
                let pattern = AmbiguousRangeResolver::pattern(&amb.range);
                return vec![ValidationResult::invalid(
                    classification,
                    format!("{} is not yet supported", pattern),
                )];
            }
        }

        let accessions = match accessions::candidate_accessions(self.ctx, classification).await {
            Ok(accessions) => accessions,
            Err(error) => return vec![ValidationResult::invalid(classification, error)],
        };
        tracing::debug!(
            classification = %classification.classification_type(),
            candidates = accessions.len(),
            "validating accessions"
        );

        join_all(
            accessions
                .into_iter()
                .map(|ac| self.validate_accession(classification, ac)),
        )
        .await
    }

    async fn validate_accession(
        &self,
        classification: &Classification,
        accession: String,
    ) -> ValidationResult {
        let checks = SequenceChecks::new(self.ctx);
        let (cds_start, errors) = match classification.variant.layer() {
            AnnotationLayer::Protein => (None, protein_errors(&checks, classification, &accession).await),
            AnnotationLayer::Cdna => match checks.cds_start(&accession).await {
                Ok(cds) => (
                    Some(cds),
                    cdna_errors(&checks, &classification.variant, &accession, cds).await,
                ),
                Err(error) => (None, vec![error]),
            },
            AnnotationLayer::Genomic => (None, genomic_errors(&checks, classification, &accession).await),
        };

        ValidationResult {
            accession: Some(accession),
            cds_start,
            classification: classification.clone(),
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

async fn protein_errors(
    checks: &SequenceChecks<'_>,
    classification: &Classification,
    ac: &str,
) -> Vec<String> {
    // (start, end, expected) residue assertions
    let mut asserted: Vec<(u64, u64, &str)> = Vec::new();
    match &classification.variant {
        ClassifiedVariant::ProteinSubstitution(s) | ClassifiedVariant::ProteinStopGain(s) => {
            asserted.push((s.pos, s.pos, &s.ref_));
        }
        ClassifiedVariant::ProteinReferenceAgree { pos, ref_ } => asserted.push((*pos, *pos, ref_)),
        ClassifiedVariant::ProteinDeletion(d) => {
            let span = &d.span;
            asserted.push((span.pos0, span.pos0, &span.aa0));
            if let (Some(aa1), Some(pos1)) = (&span.aa1, span.pos1) {
                asserted.push((pos1, pos1, aa1));
                if let Some(deleted) = &d.deleted_sequence {
                    asserted.push((span.pos0, pos1, deleted));
                }
            }
        }
        ClassifiedVariant::ProteinDelins(d) => {
            let span = &d.span;
            asserted.push((span.pos0, span.pos0, &span.aa0));
            if let (Some(aa1), Some(pos1)) = (&span.aa1, span.pos1) {
                asserted.push((pos1, pos1, aa1));
            }
        }
        ClassifiedVariant::ProteinInsertion(i) => {
            asserted.push((i.pos0, i.pos0, &i.aa0));
            asserted.push((i.pos1, i.pos1, &i.aa1));
        }
        _ => {}
    }

    let mut errors = Vec::new();
    for (start, end, expected) in asserted {
        errors.extend(checks.reference_sequence(ac, start, end, expected).await);
    }
    errors
}

async fn cdna_errors(
    checks: &SequenceChecks<'_>,
    variant: &ClassifiedVariant,
    ac: &str,
    cds: u64,
) -> Vec<String> {
    match cdna_error(checks, variant, ac, cds).await {
        Ok(error) => error.into_iter().collect(),
        Err(error) => vec![error],
    }
}

/// `Err` when a CDS-relative position does not fit on the transcript
async fn cdna_error(
    checks: &SequenceChecks<'_>,
    variant: &ClassifiedVariant,
    ac: &str,
    cds: u64,
) -> Result<Option<String>, String> {
    let at = |pos: u64| offset_position(pos, cds, ac);
    let error = match variant {
        ClassifiedVariant::CdnaSubstitution(s) => {
            let start = at(s.pos)?;
            let end = offset_position(start, (s.ref_.len() as u64).saturating_sub(1), ac)?;
            checks.reference_sequence(ac, start, end, &s.ref_).await
        }
        ClassifiedVariant::CdnaReferenceAgree { pos } => {
            checks.accession_and_positions(ac, at(*pos)?, None).await
        }
        ClassifiedVariant::CdnaDeletion(d) => {
            let (start, end) = (at(d.pos0)?, d.pos1.map(at).transpose()?);
            match &d.deleted_sequence {
                Some(deleted) => {
                    checks
                        .reference_sequence(ac, start, end.unwrap_or(start), deleted)
                        .await
                }
                None => checks.accession_and_positions(ac, start, end).await,
            }
        }
        ClassifiedVariant::CdnaDelins(d) => {
            let (start, end) = (at(d.pos0)?, d.pos1.map(at).transpose()?);
            checks.accession_and_positions(ac, start, end).await
        }
        ClassifiedVariant::CdnaInsertion(i) => {
            checks
                .accession_and_positions(ac, at(i.pos0)?, Some(at(i.pos1)?))
                .await
        }
        _ => None,
    };
    Ok(error)
}

async fn genomic_errors(
    checks: &SequenceChecks<'_>,
    classification: &Classification,
    ac: &str,
) -> Vec<String> {
    let variant = &classification.variant;
    let mut errors = Vec::new();

    if let Some(vcf) = classification.gnomad_vcf() {
        match offset_position(vcf.pos, (vcf.ref_.len() as u64).saturating_sub(1), ac) {
            Ok(end) => errors.extend(checks.reference_sequence(ac, vcf.pos, end, &vcf.ref_).await),
            Err(error) => errors.push(error),
        }
    } else {
        match variant {
            ClassifiedVariant::GenomicSubstitution(s) => {
                match offset_position(s.pos, (s.ref_.len() as u64).saturating_sub(1), ac) {
                    Ok(end) => errors.extend(checks.reference_sequence(ac, s.pos, end, &s.ref_).await),
                    Err(error) => errors.push(error),
                }
            }
            ClassifiedVariant::GenomicReferenceAgree { pos } => {
                errors.extend(checks.accession_and_positions(ac, *pos, None).await);
            }
            ClassifiedVariant::GenomicDeletion(d) => {
                errors.extend(checks.accession_and_positions(ac, d.pos0, d.pos1).await);
                if let (true, Some(deleted)) = (errors.is_empty(), &d.deleted_sequence) {
                    let end = d.pos1.unwrap_or(d.pos0);
                    errors.extend(checks.reference_sequence(ac, d.pos0, end, deleted).await);
                }
            }
            ClassifiedVariant::GenomicDelins(d) => {
                errors.extend(checks.accession_and_positions(ac, d.pos0, d.pos1).await);
            }
            ClassifiedVariant::GenomicInsertion(i) => {
                errors.extend(checks.accession_and_positions(ac, i.pos0, Some(i.pos1)).await);
            }
            ClassifiedVariant::GenomicDuplication(d) => {
                errors.extend(checks.accession_and_positions(ac, d.pos0, d.pos1).await);
            }
            ClassifiedVariant::GenomicDuplicationAmbiguous(_)
            | ClassifiedVariant::GenomicDeletionAmbiguous(_) => {
                for pos in variant.ordered_positions() {
                    errors.extend(checks.accession_and_positions(ac, pos, None).await);
                }
            }
            _ => {}
        }
    }

    if errors.is_empty() {
        if let Some(gene) = &classification.gene {
            let positions = genomic_positions(variant);
            errors.extend(checks.gene_positions(gene, ac, &positions).await);
        }
    }
    errors
}

/// Every known residue position of a genomic variant
fn genomic_positions(variant: &ClassifiedVariant) -> Vec<u64> {
    match variant {
        ClassifiedVariant::GenomicSubstitution(s) => vec![s.pos],
        ClassifiedVariant::GenomicReferenceAgree { pos } => vec![*pos],
        ClassifiedVariant::GenomicDeletion(d) => Some(d.pos0).into_iter().chain(d.pos1).collect(),
        ClassifiedVariant::GenomicDelins(d) => Some(d.pos0).into_iter().chain(d.pos1).collect(),
        ClassifiedVariant::GenomicDuplication(d) => Some(d.pos0).into_iter().chain(d.pos1).collect(),
        ClassifiedVariant::GenomicInsertion(i) => vec![i.pos0, i.pos1],
        other => other.ordered_positions(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::reference::{Assembly, Gene, GeneLocation, MockProvider, TranscriptEntry};
    use crate::tokenize::Tokenizer;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn context() -> QueryContext {
        let mut provider = MockProvider::new();
        // residue 3 is V
        provider.add_sequence("NP_000001.1", "MAVLK");
        provider.add_transcript(TranscriptEntry {
            accession: "NM_000001.1".to_string(),
            gene: Some("GENE1".to_string()),
            cds_start: Some(2),
            cds_end: Some(17),
            protein_accession: Some("NP_000001.1".to_string()),
            alignments: HashMap::new(),
        });
        provider.add_sequence("NM_000001.1", "GGATGGCAGTTCTGAAATAA");
        provider.add_sequence("NC_000001.11", "ACGTACGTACGTACGTACGT");
        provider.add_chromosome("NC_000001.11", "chr1", Assembly::GRCh38);
        provider.add_gene(Gene {
            symbol: "GENE1".to_string(),
            location: Some(GeneLocation {
                accession: "NC_000001.11".to_string(),
                start: 4,
                end: 12,
            }),
        });
        QueryContext::from_provider(Arc::new(provider))
    }

    fn classify(input: &str) -> Classification {
        let mut genes = HashMap::new();
        genes.insert("GENE1".to_string(), "GENE1".to_string());
        let tokens = Tokenizer::new().tokenize_with_genes(input, &genes);
        Classifier::new().unwrap().classify(&tokens).unwrap()
    }

    #[tokio::test]
    async fn test_protein_substitution_valid() {
        let ctx = context();
        let summary = Validator::new(&ctx).summarize(&classify("GENE1 V3E")).await;
        assert!(summary.is_valid());
        assert_eq!(
            summary.valid_results[0].accession.as_deref(),
            Some("NP_000001.1")
        );
        assert!(summary.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_protein_reference_mismatch() {
        let ctx = context();
        let summary = Validator::new(&ctx).summarize(&classify("GENE1 L3E")).await;
        assert!(!summary.is_valid());
        assert_eq!(
            summary.invalid_results[0].errors,
            vec!["Expected to find L at positions (3, 3) on NP_000001.1 but found V"]
        );
        assert_eq!(
            summary.warnings,
            vec!["Unable to find valid result for classification: protein_substitution"]
        );
    }

    #[tokio::test]
    async fn test_cdna_offsets_by_cds_start() {
        let ctx = context();
        // c.1 is transcript residue 3 (A)
        let results = Validator::new(&ctx).validate(&classify("NM_000001.1:c.1A>G")).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_valid, "{:?}", results[0].errors);
        assert_eq!(results[0].cds_start, Some(2));

        let results = Validator::new(&ctx).validate(&classify("NM_000001.1:c.1T>G")).await;
        assert!(!results[0].is_valid);
    }

    #[tokio::test]
    async fn test_cdna_missing_cds_start() {
        let ctx = context();
        let results = Validator::new(&ctx).validate(&classify("NM_999999.1:c.1A>G")).await;
        assert_eq!(
            results[0].errors,
            vec!["Unable to get CDS start for accession: NM_999999.1"]
        );
    }

    #[tokio::test]
    async fn test_ordering_short_circuits() {
        let ctx = context();
        let results = Validator::new(&ctx)
            .validate(&classify("NC_000001.11:g.8_4del"))
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].accession, None);
        assert_eq!(results[0].errors, vec![checks::ORDERING_MESSAGE]);
    }

    #[tokio::test]
    async fn test_genomic_position_out_of_range() {
        let ctx = context();
        let results = Validator::new(&ctx)
            .validate(&classify("NC_000001.11:g.15_25del"))
            .await;
        assert!(!results[0].is_valid);
    }

    #[tokio::test]
    async fn test_positions_at_u64_max_are_invalid() {
        let ctx = context();
        for input in [
            "NC_000001.11:g.18446744073709551615A>T",
            "NM_000001.1:c.18446744073709551615A>T",
            "NM_000001.1:c.18446744073709551614_18446744073709551615del",
        ] {
            let results = Validator::new(&ctx).validate(&classify(input)).await;
            assert!(!results.is_empty(), "{}", input);
            assert!(results.iter().all(|r| !r.is_valid), "{}", input);
        }
    }

    #[tokio::test]
    async fn test_gene_bounds() {
        let ctx = context();
        let inside = Validator::new(&ctx).validate(&classify("GENE1 g.6_8del")).await;
        assert!(inside[0].is_valid, "{:?}", inside[0].errors);

        let outside = Validator::new(&ctx).validate(&classify("GENE1 g.14_16del")).await;
        assert_eq!(
            outside[0].errors,
            vec!["Position 13 out of index on NC_000001.11 on gene, GENE1"]
        );
    }

    #[tokio::test]
    async fn test_unsupported_ambiguous_shape() {
        let ctx = context();
        let results = Validator::new(&ctx)
            .validate(&classify("NC_000001.11:g.(1_2)_5del"))
            .await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_valid);
        assert_eq!(results[0].errors, vec!["(#_#)_# is not yet supported"]);
    }
}
