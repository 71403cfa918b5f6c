//! Alignment mapper
//!
//! Moves position ranges between protein, cDNA and genomic coordinates.
//!
//! # Coordinate System
//!
//! | Input | Basis |
//! |-------|-------|
//! | request positions | [`ResidueMode`] chosen by the caller |
//! | returned positions | always inter-residue |
//! | cDNA positions | relative to the CDS start |
//!
//! A protein interval `[s, e)` covers the codons `[3s, 3e)` of the CDS.
//! Genomic positions come from the transcript's exon alignment on the
//! target assembly. When only the other assembly has an alignment, each end
//! is lifted separately and the mapping fails if either cannot be lifted.

use serde::{Deserialize, Serialize};

use crate::context::QueryContext;
use crate::error::FerroError;
use crate::reference::{Assembly, ResidueMode, TranscriptAlignment};
use crate::translate::assembly::chromosome_accession;

/// cDNA accession and inter-residue positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnaRepresentation {
    pub c_ac: String,
    pub c_start_pos: u64,
    pub c_end_pos: u64,
    /// 0-based CDS start on the transcript, when known
    pub cds_start: Option<u64>,
    pub residue_mode: ResidueMode,
}

/// Genomic accession and inter-residue positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicRepresentation {
    pub g_ac: String,
    pub g_start_pos: u64,
    pub g_end_pos: u64,
    pub residue_mode: ResidueMode,
}

/// Converts positions between annotation layers
pub struct AlignmentMapper<'a> {
    ctx: &'a QueryContext,
}

impl<'a> AlignmentMapper<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    /// Protein range to the cDNA range of its codons
    pub async fn p_to_c(
        &self,
        p_ac: &str,
        start: u64,
        end: u64,
        residue_mode: ResidueMode,
    ) -> Result<CdnaRepresentation, FerroError> {
        let c_ac = self
            .ctx
            .get_transcript_for_protein(p_ac)
            .await?
            .ok_or_else(|| {
                FerroError::resolution(format!("Unable to find cDNA accession for {}", p_ac))
            })?;
        let (start, end) = inter_residue_range(start, end, residue_mode)?;
        let cds_start = self.ctx.get_cds_start_end(&c_ac).await?.map(|(s, _)| s);

        tracing::debug!(p_ac, c_ac = %c_ac, start, end, "mapped protein to cDNA");
        let codon = |pos: u64| {
            pos.checked_mul(3).ok_or_else(|| FerroError::InvalidCoordinates {
                msg: format!("protein position ({}) is out of range", pos),
            })
        };
        Ok(CdnaRepresentation {
            c_start_pos: codon(start)?,
            c_end_pos: codon(end)?,
            c_ac,
            cds_start,
            residue_mode: ResidueMode::InterResidue,
        })
    }

    /// cDNA range to genomic positions on `target`.
    ///
    /// `cds_start` is looked up when not given.
    pub async fn c_to_g(
        &self,
        c_ac: &str,
        start: u64,
        end: u64,
        cds_start: Option<u64>,
        residue_mode: ResidueMode,
        target: Assembly,
    ) -> Result<GenomicRepresentation, FerroError> {
        let (start, end) = inter_residue_range(start, end, residue_mode)?;
        let cds_start = match cds_start {
            Some(cds) => cds,
            None => self
                .ctx
                .get_cds_start_end(c_ac)
                .await?
                .map(|(s, _)| s)
                .ok_or_else(|| {
                    FerroError::resolution(format!("Unable to get CDS start for {}", c_ac))
                })?,
        };
        let shift = |pos: u64| {
            pos.checked_add(cds_start).ok_or_else(|| FerroError::InvalidCoordinates {
                msg: format!("cDNA position ({}) is out of range on {}", pos, c_ac),
            })
        };
        let (tx_start, tx_end) = (shift(start)?, shift(end)?);

        if let Some(alignment) = self.ctx.get_alignment(c_ac, target).await? {
            let (g_start, g_end) = map_interval(&alignment, tx_start, tx_end)?;
            return Ok(GenomicRepresentation {
                g_ac: alignment.alt_ac,
                g_start_pos: g_start,
                g_end_pos: g_end,
                residue_mode: ResidueMode::InterResidue,
            });
        }

        let source = target.other();
        let alignment = self.ctx.get_alignment(c_ac, source).await?.ok_or_else(|| {
            FerroError::resolution(format!("Unable to find alignment for {} on {}", c_ac, target))
        })?;
        let (g_start, g_end) = map_interval(&alignment, tx_start, tx_end)?;
        tracing::debug!(c_ac, from = %source, to = %target, "lifting aligned positions");
        self.lift_interval(&alignment.alt_ac, g_start, g_end, target)
            .await
    }

    /// Protein range to genomic positions on `target`
    pub async fn p_to_g(
        &self,
        p_ac: &str,
        start: u64,
        end: u64,
        residue_mode: ResidueMode,
        target: Assembly,
    ) -> Result<GenomicRepresentation, FerroError> {
        let c = self.p_to_c(p_ac, start, end, residue_mode).await?;
        self.c_to_g(
            &c.c_ac,
            c.c_start_pos,
            c.c_end_pos,
            c.cds_start,
            ResidueMode::InterResidue,
            target,
        )
        .await
    }

    async fn lift_interval(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        target: Assembly,
    ) -> Result<GenomicRepresentation, FerroError> {
        let (chromosome, _) = self
            .ctx
            .get_chromosome_assembly(accession)
            .await?
            .ok_or_else(|| {
                FerroError::resolution(format!(
                    "Unable to get GRCh37/GRCh38 assembly for: {}",
                    accession
                ))
            })?;

        // residues on either end of the interval; an empty interval is
        // anchored on the residue to its left
        let anchors = if start == end {
            vec![start.max(1)]
        } else {
            vec![start + 1, end]
        };
        let mut lifted = Vec::with_capacity(anchors.len());
        for pos in anchors {
            let (chrom, new_pos) = self
                .ctx
                .get_liftover(&chromosome, pos, target)
                .await?
                .ok_or_else(|| FerroError::Liftover {
                    chromosome: chromosome.clone(),
                    pos,
                })?;
            lifted.push((chrom, new_pos));
        }
        let (first_chrom, first) = (lifted[0].0.clone(), lifted[0].1);
        let last = lifted[lifted.len() - 1].1;
        if lifted.iter().any(|(chrom, _)| *chrom != first_chrom) {
            return Err(FerroError::resolution(format!(
                "Positions on {} lift to different chromosomes",
                accession
            )));
        }

        let g_ac = chromosome_accession(self.ctx, target, &first_chrom)
            .await
            .ok_or_else(|| {
                FerroError::resolution(format!(
                    "Unable to find a {} accession for: {}",
                    target, accession
                ))
            })?;
        let (g_start_pos, g_end_pos) = match (start == end, start) {
            (true, 0) => (first.saturating_sub(1), first.saturating_sub(1)),
            (true, _) => (first, first),
            (false, _) => (first.min(last).saturating_sub(1), first.max(last)),
        };
        Ok(GenomicRepresentation {
            g_ac,
            g_start_pos,
            g_end_pos,
            residue_mode: ResidueMode::InterResidue,
        })
    }
}

fn inter_residue_range(
    start: u64,
    end: u64,
    residue_mode: ResidueMode,
) -> Result<(u64, u64), FerroError> {
    if residue_mode == ResidueMode::Residue && start == 0 {
        return Err(FerroError::InvalidCoordinates {
            msg: "residue positions are 1-based".to_string(),
        });
    }
    let (start, end) = residue_mode.to_inter_residue(start, Some(end));
    if end < start {
        return Err(FerroError::InvalidCoordinates {
            msg: format!("end ({}) must not be less than start ({})", end, start),
        });
    }
    Ok((start, end))
}

fn map_interval(
    alignment: &TranscriptAlignment,
    start: u64,
    end: u64,
) -> Result<(u64, u64), FerroError> {
    alignment.tx_interval_to_genomic(start, end).ok_or_else(|| {
        FerroError::resolution(format!(
            "Unable to map {} positions {} to {} onto {}",
            alignment.tx_ac, start, end, alignment.alt_ac
        ))
    })
}
