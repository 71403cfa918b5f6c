//! Translator
//!
//! Turns a valid [`ValidationResult`] into a VRS variation on one accession.
//!
//! # Coordinates
//!
//! Classification positions are 1-based residues on their own layer. cDNA
//! positions are shifted by the transcript's CDS start. Locations are built
//! in inter-residue coordinates:
//!
//! | Alteration | start | end |
//! |------------|-------|-----|
//! | insertion after `p` | `p` | `p` |
//! | substitution at `p` | `p - 1` | `p - 1 + len(alt)` |
//! | other span `p0..=p1` | `p0 - 1` | `p1` |
//!
//! Genomic duplications and deletions go through the
//! [`DupDelModeInterpreter`]; ambiguous ranges use [`ambiguous`] locations.
//!
//! # Liftover and prioritization
//!
//! Genomic results are moved to GRCh38 when liftover is requested or the
//! endpoint is [`Endpoint::Normalize`]. Normalization also asks the
//! [`PriorityResolver`](crate::reference::PriorityResolver) for a
//! representative accession.

pub mod ambiguous;
pub mod assembly;
pub mod dup_del;
pub mod prioritize;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::{ClassifiedVariant, Nomenclature};
use crate::context::QueryContext;
use crate::error::FerroError;
use crate::reference::{AnnotationLayer, ResidueMode, TranscriptPriority};
use crate::token::AltType;
use crate::validate::checks::SequenceChecks;
use crate::validate::ValidationResult;
use crate::vrs::{
    identify, Allele, CopyChange, CopyNumberChange, SequenceLocation, Variation,
};

pub use ambiguous::{ambiguous_location, AmbiguousPositions};
pub use dup_del::{DupDelMode, DupDelModeInterpreter, DupDelParams};
pub use prioritize::AccessionPrioritizer;

/// Which operation a translation is performed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    #[default]
    ToVrs,
    Normalize,
    HgvsToCopyNumberCount,
    HgvsToCopyNumberChange,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::ToVrs => write!(f, "to_vrs"),
            Endpoint::Normalize => write!(f, "normalize"),
            Endpoint::HgvsToCopyNumberCount => write!(f, "hgvs_to_copy_number_count"),
            Endpoint::HgvsToCopyNumberChange => write!(f, "hgvs_to_copy_number_change"),
        }
    }
}

/// Per-query translation settings
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub endpoint: Endpoint,
    pub dup_del_mode: DupDelMode,
    pub baseline_copies: Option<u64>,
    pub copy_change: Option<CopyChange>,
    /// Lift GRCh37 genomic results to GRCh38
    pub do_liftover: bool,
}

impl TranslateOptions {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Default::default()
        }
    }

    fn lifts(&self) -> bool {
        self.do_liftover || self.endpoint == Endpoint::Normalize
    }
}

/// A variation and the accession it was placed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub vrs_variation: Variation,
    /// Accession the location refers to
    pub vrs_seq_loc_ac: Option<String>,
    pub vrs_seq_loc_ac_status: TranscriptPriority,
    /// Accession the query was validated on
    pub og_ac: Option<String>,
    pub validation_result: ValidationResult,
}

impl TranslationResult {
    /// Ambiguous ranges and amplifications carry no reference sequence
    pub fn annotates_sequence(&self) -> bool {
        let variant = &self.validation_result.classification.variant;
        variant.ambiguous().is_none() && !matches!(variant, ClassifiedVariant::Amplification)
    }
}

/// Literal edit in 1-based residues on the variant's own layer
#[derive(Debug, Clone, PartialEq, Eq)]
struct LiteralEdit {
    alt_type: AltType,
    first: u64,
    last: u64,
    /// `None` when the state is the reference over the span
    state: Option<String>,
}

impl LiteralEdit {
    fn new(alt_type: AltType, first: u64, last: Option<u64>, state: Option<String>) -> Self {
        Self {
            alt_type,
            first,
            last: last.unwrap_or(first),
            state,
        }
    }

    fn substitution(pos: u64, alt: &str) -> Self {
        let last = pos.saturating_add((alt.len() as u64).saturating_sub(1));
        Self::new(AltType::Substitution, pos, Some(last), Some(alt.to_string()))
    }

    /// Inter-residue interval
    fn interval(&self) -> (u64, u64) {
        match self.alt_type {
            AltType::Insertion => (self.first, self.first),
            _ => (self.first.saturating_sub(1), self.last),
        }
    }

    fn with_positions(mut self, first: u64, last: u64) -> Self {
        self.first = first.min(last);
        self.last = first.max(last);
        self
    }
}

fn literal_edit(variant: &ClassifiedVariant) -> Option<LiteralEdit> {
    use ClassifiedVariant::*;
    let edit = match variant {
        ProteinSubstitution(s) => LiteralEdit::substitution(s.pos, &s.alt),
        ProteinStopGain(s) => LiteralEdit::new(AltType::StopGain, s.pos, None, Some("*".to_string())),
        ProteinReferenceAgree { pos, ref_ } => {
            LiteralEdit::new(AltType::ReferenceAgree, *pos, None, Some(ref_.clone()))
        }
        ProteinDelins(d) => LiteralEdit::new(
            AltType::Delins,
            d.span.pos0,
            d.span.pos1,
            Some(d.inserted_sequence.clone()),
        ),
        ProteinDeletion(d) => {
            LiteralEdit::new(AltType::Deletion, d.span.pos0, d.span.pos1, Some(String::new()))
        }
        ProteinInsertion(i) => LiteralEdit::new(
            AltType::Insertion,
            i.pos0,
            None,
            Some(i.inserted_sequence.clone()),
        ),
        CdnaSubstitution(s) | GenomicSubstitution(s) => LiteralEdit::substitution(s.pos, &s.alt),
        CdnaReferenceAgree { pos } | GenomicReferenceAgree { pos } => {
            LiteralEdit::new(AltType::ReferenceAgree, *pos, None, None)
        }
        CdnaDelins(d) | GenomicDelins(d) => LiteralEdit::new(
            AltType::Delins,
            d.pos0,
            d.pos1,
            Some(d.inserted_sequence.clone()),
        ),
        CdnaDeletion(d) => LiteralEdit::new(AltType::Deletion, d.pos0, d.pos1, Some(String::new())),
        CdnaInsertion(i) | GenomicInsertion(i) => LiteralEdit::new(
            AltType::Insertion,
            i.pos0,
            None,
            Some(i.inserted_sequence.clone()),
        ),
        GenomicDeletion(_)
        | GenomicDuplication(_)
        | GenomicDuplicationAmbiguous(_)
        | GenomicDeletionAmbiguous(_)
        | Amplification => return None,
    };
    Some(edit)
}

/// Where a translation ends up before the variation is built
struct Placement {
    accession: String,
    start: u64,
    end: u64,
    status: TranscriptPriority,
}

/// Builds VRS variations from validation results
pub struct Translator<'a> {
    ctx: &'a QueryContext,
}

impl<'a> Translator<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    /// Translate one valid result. Reasons for producing nothing are pushed
    /// onto `warnings`.
    pub async fn translate(
        &self,
        validation_result: &ValidationResult,
        options: &TranslateOptions,
        warnings: &mut Vec<String>,
    ) -> Option<TranslationResult> {
        let variant = &validation_result.classification.variant;
        tracing::debug!(
            classification = %variant.classification_type(),
            accession = ?validation_result.accession,
            endpoint = %options.endpoint,
            "translating"
        );

        match variant {
            ClassifiedVariant::Amplification => self.amplification(validation_result, warnings).await,
            ClassifiedVariant::GenomicDeletion(_)
            | ClassifiedVariant::GenomicDuplication(_)
            | ClassifiedVariant::GenomicDeletionAmbiguous(_)
            | ClassifiedVariant::GenomicDuplicationAmbiguous(_) => {
                self.dup_del(validation_result, options, warnings).await
            }
            _ => {
                let edit = literal_edit(variant)?;
                self.literal(validation_result, edit, options, warnings).await
            }
        }
    }

    /// Fill `location.sequence` with the reference over an exact interval
    pub async fn annotate_sequence(&self, result: &mut TranslationResult) {
        if !result.annotates_sequence() {
            return;
        }
        let Some(accession) = result.vrs_seq_loc_ac.clone() else {
            return;
        };
        let location = result.vrs_variation.location_mut();
        let Some((start, end)) = location.interval() else {
            return;
        };
        match self
            .ctx
            .get_reference_sequence(&accession, Some(start), Some(end), ResidueMode::InterResidue)
            .await
        {
            Ok(sequence) => location.sequence = Some(sequence),
            Err(e) => tracing::debug!(accession = %accession, error = %e, "no sequence for location"),
        }
    }

    async fn refget(&self, accession: &str, warnings: &mut Vec<String>) -> Option<String> {
        match self.ctx.refget_accession(accession).await {
            Ok(refget) => Some(refget),
            Err(e) => {
                tracing::debug!(accession, error = %e, "no refget accession");
                warnings.push(format!(
                    "Unable to find ga4gh sequence identifiers for: {}",
                    accession
                ));
                None
            }
        }
    }

    async fn lift(
        &self,
        accession: &str,
        positions: &[Option<u64>],
        warnings: &mut Vec<String>,
    ) -> Option<assembly::Grch38Positions> {
        let placement = match assembly::accession_assembly(self.ctx, accession).await {
            Ok(placement) => placement,
            Err(e) => {
                warnings.push(e.to_string());
                return None;
            }
        };
        match assembly::lift_placed(self.ctx, accession, placement, positions).await {
            Ok(lifted) => Some(lifted),
            Err(e) => {
                tracing::debug!(accession, error = %e, "liftover to GRCh38 failed");
                warnings.push(format!("Unable to find a GRCh38 accession for: {}", accession));
                None
            }
        }
    }

    /// Representative placement of an inter-residue interval, if the
    /// resolver has one
    async fn prioritized(
        &self,
        accession: &str,
        (start, end): (u64, u64),
        layer: AnnotationLayer,
        gene: Option<&str>,
    ) -> Option<Placement> {
        match self.ctx.get_prioritized(accession, start, end, layer, gene).await {
            Ok(Some(p)) => {
                let offset = p.cds_start.unwrap_or(0);
                Some(Placement {
                    accession: p.accession,
                    start: p.start.saturating_add(offset),
                    end: p.end.saturating_add(offset),
                    status: p.status,
                })
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(accession, error = %e, "priority lookup failed");
                None
            }
        }
    }

    async fn literal(
        &self,
        validation_result: &ValidationResult,
        mut edit: LiteralEdit,
        options: &TranslateOptions,
        warnings: &mut Vec<String>,
    ) -> Option<TranslationResult> {
        let classification = &validation_result.classification;
        let layer = classification.variant.layer();
        let og_ac = validation_result.accession.clone()?;
        let mut accession = og_ac.clone();

        let offset = match (layer, validation_result.cds_start) {
            (AnnotationLayer::Cdna, Some(cds)) => cds,
            (AnnotationLayer::Cdna, None) => match SequenceChecks::new(self.ctx).cds_start(&og_ac).await {
                Ok(cds) => cds,
                Err(message) => {
                    warnings.push(message);
                    return None;
                }
            },
            _ => 0,
        };

        if layer == AnnotationLayer::Genomic && options.lifts() {
            let lifted = self
                .lift(&og_ac, &[Some(edit.first), Some(edit.last)], warnings)
                .await?;
            if let [Some(first), Some(last)] = lifted.positions[..] {
                edit = edit.with_positions(first, last);
            }
            accession = lifted.accession;
        }

        let interval = edit.interval();
        let prioritized = if options.endpoint == Endpoint::Normalize {
            self.prioritized(&accession, interval, layer, classification.gene.as_deref())
                .await
        } else {
            None
        };
        let placement = prioritized.unwrap_or(Placement {
            accession,
            start: interval.0.saturating_add(offset),
            end: interval.1.saturating_add(offset),
            status: TranscriptPriority::Na,
        });

        let state = match edit.state {
            Some(state) => state,
            None => match self
                .ctx
                .get_reference_sequence(
                    &placement.accession,
                    Some(placement.start),
                    Some(placement.end),
                    ResidueMode::InterResidue,
                )
                .await
            {
                Ok(reference) => reference,
                Err(e) => {
                    tracing::debug!(accession = %placement.accession, error = %e, "no reference state");
                    warnings.push(format!(
                        "Unable to get sequence on {} from {}",
                        placement.accession, placement.start
                    ));
                    return None;
                }
            },
        };

        let refget = self.refget(&placement.accession, warnings).await?;
        let location = SequenceLocation::new(&refget, placement.start, placement.end);
        let allele = match self
            .ctx
            .normalize_allele(Allele::new(location, state), &placement.accession)
            .await
        {
            Ok(allele) => allele,
            Err(e) => {
                warnings.push(match e {
                    FerroError::Normalization { .. } => e.to_string(),
                    other => format!("Unable to normalize allele: {}", other),
                });
                return None;
            }
        };
        let mut variation = Variation::Allele(allele);
        identify(&mut variation);

        Some(TranslationResult {
            vrs_variation: variation,
            vrs_seq_loc_ac: Some(placement.accession),
            vrs_seq_loc_ac_status: placement.status,
            og_ac: Some(og_ac),
            validation_result: validation_result.clone(),
        })
    }

    async fn dup_del(
        &self,
        validation_result: &ValidationResult,
        options: &TranslateOptions,
        warnings: &mut Vec<String>,
    ) -> Option<TranslationResult> {
        let classification = &validation_result.classification;
        let variant = &classification.variant;
        let alt_type = variant.alt_type();
        let og_ac = validation_result.accession.clone()?;

        let mut positions = match variant {
            ClassifiedVariant::GenomicDeletion(d) => vec![Some(d.pos0), d.pos1],
            ClassifiedVariant::GenomicDuplication(d) => vec![Some(d.pos0), d.pos1],
            _ => AmbiguousPositions::from_range(&variant.ambiguous()?.range).to_vec(),
        };
        let mut accession = og_ac.clone();
        if options.lifts() {
            let lifted = self.lift(&og_ac, &positions, warnings).await?;
            accession = lifted.accession;
            positions = lifted.positions;
        }

        let mut status = TranscriptPriority::Na;
        let location = match variant.ambiguous() {
            Some(amb) => {
                let Some(ambiguous_type) = amb.resolution.supported() else {
                    warnings.push(
                        FerroError::UnsupportedVariant {
                            variant_type: crate::classify::ambiguous::AmbiguousRangeResolver::pattern(
                                &amb.range,
                            ),
                        }
                        .to_string(),
                    );
                    return None;
                };
                let refget = self.refget(&accession, warnings).await?;
                let positions = AmbiguousPositions::from_slice(&positions)?;
                ambiguous_location(&refget, ambiguous_type, positions)?
            }
            None => {
                let first = positions.first().copied().flatten()?;
                let last = positions.get(1).copied().flatten().unwrap_or(first);
                let mut interval = (first.saturating_sub(1), last);
                if options.endpoint == Endpoint::Normalize {
                    let gene = classification.gene.as_deref();
                    if let Some(p) = self
                        .prioritized(&accession, interval, AnnotationLayer::Genomic, gene)
                        .await
                    {
                        accession = p.accession;
                        interval = (p.start, p.end);
                        status = p.status;
                    }
                }
                let refget = self.refget(&accession, warnings).await?;
                SequenceLocation::new(&refget, interval.0, interval.1)
            }
        };

        let params = DupDelParams {
            baseline_copies: options.baseline_copies,
            copy_change: options.copy_change,
            alt: None,
        };
        let interpreter = DupDelModeInterpreter::new(self.ctx);
        let built = match options.endpoint {
            Endpoint::Normalize => {
                let mode = effective_mode(classification.nomenclature, options.dup_del_mode);
                return interpreter
                    .interpret(mode, alt_type, location, &accession, &params, warnings)
                    .await
                    .map(|variation| TranslationResult {
                        vrs_variation: variation,
                        vrs_seq_loc_ac: Some(accession),
                        vrs_seq_loc_ac_status: status,
                        og_ac: Some(og_ac),
                        validation_result: validation_result.clone(),
                    });
            }
            Endpoint::HgvsToCopyNumberCount => match options.baseline_copies {
                Some(baseline) => dup_del::copy_number_count(alt_type, location, baseline).map(Some),
                None => Err(FerroError::MissingParameter {
                    parameter: "baseline_copies".to_string(),
                    context: "Copy Number Count Variation".to_string(),
                }),
            },
            Endpoint::HgvsToCopyNumberChange => {
                dup_del::copy_number_change(alt_type, location, options.copy_change).map(Some)
            }
            Endpoint::ToVrs => {
                interpreter
                    .default_mode(alt_type, location, &accession, &params)
                    .await
            }
        };

        match built {
            Ok(Some(variation)) => Some(TranslationResult {
                vrs_variation: variation,
                vrs_seq_loc_ac: Some(accession),
                vrs_seq_loc_ac_status: status,
                og_ac: Some(og_ac),
                validation_result: validation_result.clone(),
            }),
            Ok(None) => None,
            Err(e) => {
                warnings.push(e.to_string());
                None
            }
        }
    }

    /// High-level gain over the gene's GRCh38 location
    async fn amplification(
        &self,
        validation_result: &ValidationResult,
        warnings: &mut Vec<String>,
    ) -> Option<TranslationResult> {
        let gene = validation_result.classification.gene.as_deref()?;
        let location = match self.ctx.normalize_gene(gene).await {
            Ok(m) => m.matched().and_then(|g| g.location.clone()),
            Err(e) => {
                tracing::warn!(gene, error = %e, "gene normalization failed");
                None
            }
        };
        let Some(location) = location else {
            warnings.push(format!("No VRS SequenceLocation found for gene: {}", gene));
            return None;
        };

        let refget = self.refget(&location.accession, warnings).await?;
        let mut variation = Variation::CopyNumberChange(CopyNumberChange {
            id: None,
            digest: None,
            label: None,
            location: SequenceLocation::new(&refget, location.start, location.end),
            copy_change: CopyChange::HighLevelGain,
        });
        identify(&mut variation);

        Some(TranslationResult {
            vrs_variation: variation,
            vrs_seq_loc_ac: Some(location.accession),
            vrs_seq_loc_ac_status: TranscriptPriority::Na,
            og_ac: None,
            validation_result: validation_result.clone(),
        })
    }
}

/// gnomAD VCF input is always translated as a literal allele
pub fn effective_mode(nomenclature: Nomenclature, mode: DupDelMode) -> DupDelMode {
    match nomenclature {
        Nomenclature::GnomadVcf => DupDelMode::Allele,
        _ => mode,
    }
}
