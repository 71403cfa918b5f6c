//! Assembly resolution and GRCh38 liftover of genomic positions

use crate::context::QueryContext;
use crate::error::FerroError;
use crate::reference::Assembly;

/// RefSeq `NC_` accession for a chromosome on an assembly
pub async fn chromosome_accession(
    ctx: &QueryContext,
    assembly: Assembly,
    chromosome: &str,
) -> Option<String> {
    let query = format!("{}:{}", assembly, chromosome);
    match ctx.translate_identifier(&query, Some("refseq")).await {
        Ok(aliases) => aliases
            .iter()
            .find_map(|a| a.strip_prefix("refseq:").filter(|ac| ac.starts_with("NC_")))
            .map(str::to_string),
        Err(e) => {
            tracing::debug!(query = %query, error = %e, "no chromosome accession");
            None
        }
    }
}

/// Genomic positions moved onto GRCh38
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grch38Positions {
    pub accession: String,
    /// Same order as the input; unknown positions stay `None`
    pub positions: Vec<Option<u64>>,
    /// Whether the input was on GRCh37
    pub lifted: bool,
}

/// Assembly of a genomic accession, as a resolution error when unknown
pub async fn accession_assembly(
    ctx: &QueryContext,
    accession: &str,
) -> Result<(String, Assembly), FerroError> {
    match ctx.get_chromosome_assembly(accession).await {
        Ok(Some(placement)) => Ok(placement),
        Ok(None) => Err(FerroError::resolution(format!(
            "Unable to get GRCh37/GRCh38 assembly for: {}",
            accession
        ))),
        Err(e) => {
            tracing::warn!(accession, error = %e, "assembly lookup failed");
            Err(FerroError::resolution(format!(
                "Unable to get GRCh37/GRCh38 assembly for: {}",
                accession
            )))
        }
    }
}

/// Lift every known position on `accession` to GRCh38.
///
/// GRCh38 input is returned unchanged. Fails on the first position that
/// cannot be lifted, or when the lifted chromosome has no RefSeq accession.
pub async fn lift_to_grch38(
    ctx: &QueryContext,
    accession: &str,
    positions: &[Option<u64>],
) -> Result<Grch38Positions, FerroError> {
    let placement = accession_assembly(ctx, accession).await?;
    lift_placed(ctx, accession, placement, positions).await
}

/// [`lift_to_grch38`] for an accession whose placement is already known
pub async fn lift_placed(
    ctx: &QueryContext,
    accession: &str,
    (chromosome, assembly): (String, Assembly),
    positions: &[Option<u64>],
) -> Result<Grch38Positions, FerroError> {
    if assembly == Assembly::GRCh38 {
        return Ok(Grch38Positions {
            accession: accession.to_string(),
            positions: positions.to_vec(),
            lifted: false,
        });
    }

    let mut lifted = Vec::with_capacity(positions.len());
    let mut target_chromosome: Option<String> = None;
    for pos in positions {
        let Some(pos) = *pos else {
            lifted.push(None);
            continue;
        };
        match ctx.get_liftover(&chromosome, pos, Assembly::GRCh38).await? {
            Some((chrom, new_pos)) => {
                if target_chromosome.as_deref().is_some_and(|c| c != chrom) {
                    return Err(FerroError::resolution(format!(
                        "Positions on {} lift to different chromosomes",
                        accession
                    )));
                }
                target_chromosome = Some(chrom);
                lifted.push(Some(new_pos));
            }
            None => {
                return Err(FerroError::Liftover {
                    chromosome: chromosome.clone(),
                    pos,
                })
            }
        }
    }

    let chromosome = target_chromosome.unwrap_or(chromosome);
    let new_accession = chromosome_accession(ctx, Assembly::GRCh38, &chromosome)
        .await
        .ok_or_else(|| {
            FerroError::resolution(format!(
                "Unable to find a GRCh38 accession for: {}",
                accession
            ))
        })?;
    tracing::debug!(from = accession, to = %new_accession, "lifted to GRCh38");

    Ok(Grch38Positions {
        accession: new_accession,
        positions: lifted,
        lifted: true,
    })
}
