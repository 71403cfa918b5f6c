//! Transcript, assembly and gene models shared by the collaborator traits
//!
//! # Coordinate System
//!
//! | Field | Basis |
//! |-------|-------|
//! | `ExonAlignment.tx_start/tx_end` | 0-based half-open, transcript |
//! | `ExonAlignment.alt_start/alt_end` | 0-based half-open, genomic |
//! | `GeneLocation.start/end` | 0-based half-open |
//! | `PrioritizedLocation.start/end` | 0-based half-open |
//! | CDS start/end from [`TranscriptDatabase`](super::TranscriptDatabase) | 0-based half-open |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FerroError;

/// Genome assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Assembly {
    /// GRCh37 / hg19
    GRCh37,
    /// GRCh38 / hg38
    #[default]
    GRCh38,
}

impl Assembly {
    /// Parse an assembly name, accepting UCSC aliases.
    ///
    /// NCBI36/hg18 are recognized and rejected as unsupported.
    pub fn parse(name: &str) -> Result<Self, FerroError> {
        match name {
            "GRCh38" | "hg38" => Ok(Assembly::GRCh38),
            "GRCh37" | "hg19" => Ok(Assembly::GRCh37),
            "NCBI36" | "hg18" => Err(FerroError::resolution(format!(
                "{} assembly is not currently supported",
                name
            ))),
            other => Err(FerroError::resolution(format!(
                "Unknown assembly: {}",
                other
            ))),
        }
    }

    /// The other assembly
    pub fn other(&self) -> Self {
        match self {
            Assembly::GRCh37 => Assembly::GRCh38,
            Assembly::GRCh38 => Assembly::GRCh37,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Assembly::GRCh37 => "GRCh37",
            Assembly::GRCh38 => "GRCh38",
        }
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strand orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Strand {
    #[serde(rename = "+")]
    #[default]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

/// Coordinate convention for positions passed to and from collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResidueMode {
    /// 1-based, inclusive
    #[default]
    Residue,
    /// 0-based, half-open
    InterResidue,
}

impl ResidueMode {
    /// Convert a position range to 0-based half-open.
    ///
    /// A missing `end` selects the single residue at `start`.
    pub fn to_inter_residue(&self, start: u64, end: Option<u64>) -> (u64, u64) {
        match self {
            ResidueMode::Residue => {
                let start0 = start.saturating_sub(1);
                (start0, end.unwrap_or(start))
            }
            ResidueMode::InterResidue => (start, end.unwrap_or(start.saturating_add(1))),
        }
    }
}

/// Molecule layer a position refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLayer {
    Protein,
    Cdna,
    Genomic,
}

impl fmt::Display for AnnotationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnnotationLayer::Protein => "p",
            AnnotationLayer::Cdna => "c",
            AnnotationLayer::Genomic => "g",
        };
        write!(f, "{}", s)
    }
}

/// Accession family requested from the transcript database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessionKind {
    Protein,
    Cdna,
    Genomic,
}

/// Transcript priority, best first.
///
/// The derived ordering is the selection order: `ManeSelect < ManePlusClinical
/// < LongestCompatibleRemaining < Grch38 < Na`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptPriority {
    ManeSelect,
    ManePlusClinical,
    LongestCompatibleRemaining,
    #[serde(rename = "GRCh38")]
    Grch38,
    #[default]
    Na,
}

impl TranscriptPriority {
    pub fn is_mane(&self) -> bool {
        matches!(
            self,
            TranscriptPriority::ManeSelect | TranscriptPriority::ManePlusClinical
        )
    }
}

impl fmt::Display for TranscriptPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TranscriptPriority::ManeSelect => "mane_select",
            TranscriptPriority::ManePlusClinical => "mane_plus_clinical",
            TranscriptPriority::LongestCompatibleRemaining => "longest_compatible_remaining",
            TranscriptPriority::Grch38 => "GRCh38",
            TranscriptPriority::Na => "na",
        };
        write!(f, "{}", s)
    }
}

/// One aligned exon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExonAlignment {
    pub tx_start: u64,
    pub tx_end: u64,
    pub alt_start: u64,
    pub alt_end: u64,
}

/// Transcript-to-genome exon alignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptAlignment {
    pub tx_ac: String,
    /// Genomic accession the transcript is aligned to
    pub alt_ac: String,
    pub strand: Strand,
    pub exons: Vec<ExonAlignment>,
}

impl TranscriptAlignment {
    /// Map a 0-based transcript base to its 0-based genomic base
    pub fn tx_to_genomic(&self, tx_pos: u64) -> Option<u64> {
        let exon = self
            .exons
            .iter()
            .find(|e| tx_pos >= e.tx_start && tx_pos < e.tx_end)?;
        let offset = tx_pos - exon.tx_start;
        match self.strand {
            Strand::Plus => Some(exon.alt_start + offset),
            Strand::Minus => exon.alt_end.checked_sub(offset + 1),
        }
    }

    /// Map a 0-based half-open transcript interval to a genomic interval.
    ///
    /// An empty interval stays empty, anchored on the base to its left (or
    /// the first base when it sits at the transcript start).
    pub fn tx_interval_to_genomic(&self, start: u64, end: u64) -> Option<(u64, u64)> {
        if end < start {
            return None;
        }
        if end == start {
            let boundary = match (start.checked_sub(1), self.strand) {
                (Some(left), Strand::Plus) => self.tx_to_genomic(left)? + 1,
                (Some(left), Strand::Minus) => self.tx_to_genomic(left)?,
                (None, Strand::Plus) => self.tx_to_genomic(0)?,
                (None, Strand::Minus) => self.tx_to_genomic(0)? + 1,
            };
            return Some((boundary, boundary));
        }
        let first = self.tx_to_genomic(start)?;
        let last = self.tx_to_genomic(end - 1)?;
        let (lo, hi) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        Some((lo, hi + 1))
    }
}

/// Genomic location of a gene on its priority sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneLocation {
    pub accession: String,
    pub start: u64,
    pub end: u64,
}

impl GeneLocation {
    /// Does the 0-based half-open interval fall inside the gene?
    pub fn contains(&self, start: u64, end: u64) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Canonical gene record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub symbol: String,
    /// GRCh38 location
    pub location: Option<GeneLocation>,
}

/// Gene normalizer match strength. `NoMatch` means the term is not a gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    NoMatch,
    Alias,
    PrevSymbol,
    Symbol,
    ConceptId,
}

/// Result of normalizing a gene term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneMatch {
    pub match_type: MatchType,
    pub gene: Option<Gene>,
}

impl GeneMatch {
    pub fn no_match() -> Self {
        Self {
            match_type: MatchType::NoMatch,
            gene: None,
        }
    }

    /// The canonical gene, if the term matched
    pub fn matched(&self) -> Option<&Gene> {
        match self.match_type {
            MatchType::NoMatch => None,
            _ => self.gene.as_ref(),
        }
    }
}

/// Representative location chosen by the priority resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizedLocation {
    pub accession: String,
    pub start: u64,
    pub end: u64,
    pub status: TranscriptPriority,
    /// CDS start of the chosen transcript (cDNA only)
    pub cds_start: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_parse() {
        assert_eq!(Assembly::parse("hg38").unwrap(), Assembly::GRCh38);
        assert_eq!(Assembly::parse("GRCh37").unwrap(), Assembly::GRCh37);
        assert_eq!(
            Assembly::parse("hg18").unwrap_err().to_string(),
            "hg18 assembly is not currently supported"
        );
    }

    #[test]
    fn test_priority_order() {
        let mut statuses = vec![
            TranscriptPriority::Na,
            TranscriptPriority::Grch38,
            TranscriptPriority::ManeSelect,
            TranscriptPriority::LongestCompatibleRemaining,
            TranscriptPriority::ManePlusClinical,
        ];
        statuses.sort();
        assert_eq!(statuses[0], TranscriptPriority::ManeSelect);
        assert_eq!(statuses[4], TranscriptPriority::Na);
    }

    #[test]
    fn test_residue_mode_conversion() {
        assert_eq!(ResidueMode::Residue.to_inter_residue(600, None), (599, 600));
        assert_eq!(ResidueMode::Residue.to_inter_residue(10, Some(12)), (9, 12));
        assert_eq!(ResidueMode::InterResidue.to_inter_residue(9, Some(12)), (9, 12));
        assert_eq!(
            ResidueMode::InterResidue.to_inter_residue(u64::MAX, None),
            (u64::MAX, u64::MAX)
        );
    }

    #[test]
    fn test_alignment_plus_strand() {
        let alignment = TranscriptAlignment {
            tx_ac: "NM_1.1".to_string(),
            alt_ac: "NC_1.1".to_string(),
            strand: Strand::Plus,
            exons: vec![
                ExonAlignment { tx_start: 0, tx_end: 10, alt_start: 100, alt_end: 110 },
                ExonAlignment { tx_start: 10, tx_end: 20, alt_start: 200, alt_end: 210 },
            ],
        };
        assert_eq!(alignment.tx_to_genomic(0), Some(100));
        assert_eq!(alignment.tx_to_genomic(12), Some(202));
        assert_eq!(alignment.tx_to_genomic(20), None);
        assert_eq!(alignment.tx_interval_to_genomic(8, 12), Some((108, 202)));
        assert_eq!(alignment.tx_interval_to_genomic(5, 5), Some((105, 105)));
        assert_eq!(alignment.tx_interval_to_genomic(0, 0), Some((100, 100)));
        assert_eq!(alignment.tx_interval_to_genomic(12, 8), None);
    }

    #[test]
    fn test_alignment_minus_strand() {
        let alignment = TranscriptAlignment {
            tx_ac: "NM_2.1".to_string(),
            alt_ac: "NC_1.1".to_string(),
            strand: Strand::Minus,
            exons: vec![ExonAlignment { tx_start: 0, tx_end: 10, alt_start: 100, alt_end: 110 }],
        };
        assert_eq!(alignment.tx_to_genomic(0), Some(109));
        assert_eq!(alignment.tx_interval_to_genomic(0, 3), Some((107, 110)));
        assert_eq!(alignment.tx_interval_to_genomic(3, 3), Some((107, 107)));
        assert_eq!(alignment.tx_interval_to_genomic(0, 0), Some((110, 110)));
    }

    #[test]
    fn test_gene_match() {
        assert!(GeneMatch::no_match().matched().is_none());
        let m = GeneMatch {
            match_type: MatchType::Symbol,
            gene: Some(Gene { symbol: "BRAF".to_string(), location: None }),
        };
        assert_eq!(m.matched().map(|g| g.symbol.as_str()), Some("BRAF"));
    }
}
