//! Fully-justified allele normalization
//!
//! An edit is trimmed of the bases it shares with the reference, then
//! expanded left and right through any repeat it sits in, so every
//! equivalent spelling of the same change lands on one location/state pair.
//!
//! Sequence is fetched in a window around the allele. If the expanded edit
//! reaches the edge of the window the window is doubled and the edit is
//! recomputed, up to a configured ceiling.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FerroError;
use crate::reference::{is_protein_accession, AlleleNormalizer, ResidueMode, SequenceAccess};
use crate::vrs::models::{Allele, SequenceLocation};

pub const DEFAULT_WINDOW: u64 = 100;
pub const DEFAULT_MAX_WINDOW: u64 = 1_000_000;

/// A justified edit in window coordinates (0-based, half-open)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Justified {
    pub start: usize,
    pub end: usize,
    pub state: Vec<u8>,
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Steps the edit can shift left of `pos` while every non-empty allele,
/// read circularly from its end, keeps matching the reference
fn roll_left(sequence: &[u8], alleles: [&[u8]; 2], pos: usize) -> usize {
    let alleles: Vec<&[u8]> = alleles.into_iter().filter(|a| !a.is_empty()).collect();
    if alleles.is_empty() {
        return 0;
    }
    (0..pos)
        .take_while(|&d| {
            alleles
                .iter()
                .all(|a| a[a.len() - 1 - d % a.len()] == sequence[pos - 1 - d])
        })
        .count()
}

/// Steps the edit can shift right of `pos`, reading alleles from their start
fn roll_right(sequence: &[u8], alleles: [&[u8]; 2], pos: usize) -> usize {
    let alleles: Vec<&[u8]> = alleles.into_iter().filter(|a| !a.is_empty()).collect();
    if alleles.is_empty() {
        return 0;
    }
    (0..sequence.len().saturating_sub(pos))
        .take_while(|&d| alleles.iter().all(|a| a[d % a.len()] == sequence[pos + d]))
        .count()
}

/// Fully justify replacing `sequence[start..end]` with `alt`.
///
/// A no-op edit (`alt` equal to the reference span) is returned as given.
pub fn justify(sequence: &[u8], start: usize, end: usize, alt: &[u8]) -> Result<Justified, FerroError> {
    if start > end || end > sequence.len() {
        return Err(FerroError::Normalization {
            msg: format!(
                "interval {}-{} is outside a sequence of length {}",
                start,
                end,
                sequence.len()
            ),
        });
    }
    let reference = &sequence[start..end];
    if reference == alt {
        return Ok(Justified {
            start,
            end,
            state: alt.to_vec(),
        });
    }

    let prefix = common_prefix(reference, alt);
    let (ref_rest, alt_rest) = (&reference[prefix..], &alt[prefix..]);
    let suffix = common_suffix(ref_rest, alt_rest);
    let ref_core = &ref_rest[..ref_rest.len() - suffix];
    let alt_core = &alt_rest[..alt_rest.len() - suffix];
    let (s, e) = (start + prefix, end - suffix);

    let new_start = s - roll_left(sequence, [ref_core, alt_core], s);
    let new_end = e + roll_right(sequence, [ref_core, alt_core], e);

    let mut state = Vec::with_capacity((s - new_start) + alt_core.len() + (new_end - e));
    state.extend_from_slice(&sequence[new_start..s]);
    state.extend_from_slice(alt_core);
    state.extend_from_slice(&sequence[e..new_end]);

    Ok(Justified {
        start: new_start,
        end: new_end,
        state,
    })
}

/// [`AlleleNormalizer`] over any [`SequenceAccess`]
pub struct FullyJustifiedNormalizer {
    sequences: Arc<dyn SequenceAccess>,
    window: u64,
    max_window: u64,
}

impl FullyJustifiedNormalizer {
    pub fn new(sequences: Arc<dyn SequenceAccess>) -> Self {
        Self {
            sequences,
            window: DEFAULT_WINDOW,
            max_window: DEFAULT_MAX_WINDOW,
        }
    }

    pub fn with_window(mut self, window: u64, max_window: u64) -> Self {
        self.window = window.max(1);
        self.max_window = max_window.max(self.window);
        self
    }
}

#[async_trait]
impl AlleleNormalizer for FullyJustifiedNormalizer {
    async fn normalize(&self, allele: Allele, accession: &str) -> Result<Allele, FerroError> {
        if is_protein_accession(accession) {
            return Ok(allele);
        }
        let (start, end) = allele.location.interval().ok_or_else(|| FerroError::Normalization {
            msg: "allele location must have exact coordinates".to_string(),
        })?;
        let total = self.sequences.sequence_length(accession).await?;
        if start > end || end > total {
            return Err(FerroError::Normalization {
                msg: format!(
                    "interval {}-{} is outside {} (length {})",
                    start, end, accession, total
                ),
            });
        }
        let alt = allele.state.sequence.to_ascii_uppercase();

        let mut window = self.window;
        loop {
            let lo = start.saturating_sub(window);
            let hi = end.saturating_add(window).min(total);
            let seq = self
                .sequences
                .get_reference_sequence(accession, Some(lo), Some(hi), ResidueMode::InterResidue)
                .await?
                .to_ascii_uppercase();
            if seq.len() as u64 != hi - lo {
                return Err(FerroError::SequenceNotFound {
                    accession: accession.to_string(),
                    start: lo,
                    end: hi,
                });
            }

            let (rel_start, rel_end) = ((start - lo) as usize, (end - lo) as usize);
            if seq.as_bytes()[rel_start..rel_end] == *alt.as_bytes() {
                return Ok(allele);
            }
            let justified = justify(seq.as_bytes(), rel_start, rel_end, alt.as_bytes())?;

            let open_left = justified.start == 0 && lo > 0;
            let open_right = justified.end == seq.len() && hi < total;
            if !open_left && !open_right {
                let location = SequenceLocation::new(
                    allele.location.refget_accession(),
                    lo + justified.start as u64,
                    lo + justified.end as u64,
                );
                return Ok(Allele::new(
                    location,
                    String::from_utf8_lossy(&justified.state).into_owned(),
                ));
            }
            if window >= self.max_window {
                return Err(FerroError::Normalization {
                    msg: format!(
                        "repeat at {}:{}-{} extends past the {} bp normalization window",
                        accession, start, end, self.max_window
                    ),
                });
            }
            window = window.saturating_mul(2).min(self.max_window);
            tracing::debug!(accession, window, "widening normalization window");
        }
    }
}
