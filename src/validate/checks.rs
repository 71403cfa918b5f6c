//! Sequence-level checks shared by every classification family
//!
//! Positions are 1-based residues unless stated otherwise. Each check
//! returns the error message to record, or `None` when it passes.

use crate::context::QueryContext;
use crate::error::FerroError;
use crate::reference::{Assembly, ResidueMode};

pub const ORDERING_MESSAGE: &str =
    "Positions should contain two different positions and should be listed from 5' to 3'";

/// Known positions must be strictly increasing
pub fn five_prime_to_three_prime(positions: &[u64]) -> Option<String> {
    positions
        .windows(2)
        .any(|w| w[1] <= w[0])
        .then(|| ORDERING_MESSAGE.to_string())
}

/// `pos + offset` on `accession`, or the error for a position past the end
/// of any sequence
pub fn offset_position(pos: u64, offset: u64, accession: &str) -> Result<u64, String> {
    pos.checked_add(offset)
        .ok_or_else(|| format!("Position ({}) not valid on accession ({})", pos, accession))
}

fn describe(accession: &str, err: FerroError) -> String {
    match err {
        FerroError::ReferenceNotFound { .. } => format!("Accession does not exist: {}", accession),
        other => other.to_string(),
    }
}

/// Checks that call out to collaborators
pub struct SequenceChecks<'a> {
    ctx: &'a QueryContext,
}

impl<'a> SequenceChecks<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    /// The residues `start..=end` of `accession` must equal `expected`
    pub async fn reference_sequence(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        expected: &str,
    ) -> Option<String> {
        match self
            .ctx
            .get_reference_sequence(accession, Some(start), Some(end), ResidueMode::Residue)
            .await
        {
            Ok(actual) if actual.eq_ignore_ascii_case(expected) => None,
            Ok(actual) => Some(format!(
                "Expected to find {} at positions ({}, {}) on {} but found {}",
                expected, start, end, accession, actual
            )),
            Err(e) => Some(describe(accession, e)),
        }
    }

    /// The accession exists and covers `start` (and `end`, if given)
    pub async fn accession_and_positions(
        &self,
        accession: &str,
        start: u64,
        end: Option<u64>,
    ) -> Option<String> {
        let fetched = self
            .ctx
            .get_reference_sequence(accession, Some(start), end, ResidueMode::Residue)
            .await;
        let sequence = match fetched {
            Ok(sequence) => sequence,
            Err(e) => return Some(describe(accession, e)),
        };
        match end {
            Some(end) if end.checked_sub(start).and_then(|d| d.checked_add(1))
                != Some(sequence.len() as u64) =>
            {
                Some(format!(
                    "Positions ({}, {}) not valid on accession ({})",
                    start, end, accession
                ))
            }
            None if sequence.is_empty() => Some(format!(
                "Position ({}) not valid on accession ({})",
                start, accession
            )),
            _ => None,
        }
    }

    /// 0-based CDS start of a transcript
    pub async fn cds_start(&self, accession: &str) -> Result<u64, String> {
        match self.ctx.get_cds_start_end(accession).await {
            Ok(Some((start, _))) => Ok(start),
            Ok(None) => Err(format!("Unable to get CDS start for accession: {}", accession)),
            Err(e) => {
                tracing::warn!(accession, error = %e, "CDS lookup failed");
                Err(format!("Unable to get CDS start for accession: {}", accession))
            }
        }
    }

    /// Every known residue position must fall inside the gene's span on
    /// `accession`. The gene location is on GRCh38 and is lifted to GRCh37
    /// when the accession is a GRCh37 sequence.
    pub async fn gene_positions(
        &self,
        gene: &str,
        accession: &str,
        positions: &[u64],
    ) -> Option<String> {
        let location = match self.ctx.normalize_gene(gene).await {
            Ok(m) => m.matched().and_then(|g| g.location.clone()),
            Err(e) => return Some(e.to_string()),
        };
        let Some(location) = location else {
            return Some(format!(
                "gene-normalizer unable to find location for gene: {}",
                gene
            ));
        };
        // 0-based inclusive bounds
        let (mut gene_start, mut gene_end) = (location.start, location.end.saturating_sub(1));

        match self.ctx.get_chromosome_assembly(accession).await {
            Ok(Some((chromosome, Assembly::GRCh37))) => {
                for bound in [&mut gene_start, &mut gene_end] {
                    match self.ctx.get_liftover(&chromosome, *bound, Assembly::GRCh37).await {
                        Ok(Some((_, lifted))) => *bound = lifted,
                        Ok(None) => {
                            return Some(format!("{} does not exist on {}", bound, chromosome))
                        }
                        Err(e) => return Some(e.to_string()),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => return Some(e.to_string()),
        }

        positions
            .iter()
            .map(|p| p.saturating_sub(1))
            .find(|p| !(gene_start..=gene_end).contains(p))
            .map(|p| {
                format!(
                    "Position {} out of index on {} on gene, {}",
                    p, accession, gene
                )
            })
    }
}
