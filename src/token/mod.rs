//! Token model
//!
//! A [`Token`] is one lexical unit of a query. Its [`TokenType`] is derived
//! from the payload, so a token can never carry fields that disagree with its
//! type.

pub mod amino_acid;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token types produced by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Amplification,
    CdnaDeletion,
    CdnaDelins,
    CdnaInsertion,
    CdnaReferenceAgree,
    CdnaSubstitution,
    Gene,
    GenomicDeletion,
    GenomicDeletionAmbiguous,
    GenomicDelins,
    GenomicDuplication,
    GenomicDuplicationAmbiguous,
    GenomicInsertion,
    GenomicReferenceAgree,
    GenomicSubstitution,
    GnomadVcf,
    Hgvs,
    ProteinStopGain,
    ProteinDeletion,
    ProteinDelins,
    ProteinInsertion,
    ProteinSubstitution,
    ProteinReferenceAgree,
    Unknown,
}

impl TokenType {
    /// snake_case name used in JSON and warnings
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Amplification => "amplification",
            TokenType::CdnaDeletion => "cdna_deletion",
            TokenType::CdnaDelins => "cdna_delins",
            TokenType::CdnaInsertion => "cdna_insertion",
            TokenType::CdnaReferenceAgree => "cdna_reference_agree",
            TokenType::CdnaSubstitution => "cdna_substitution",
            TokenType::Gene => "gene",
            TokenType::GenomicDeletion => "genomic_deletion",
            TokenType::GenomicDeletionAmbiguous => "genomic_deletion_ambiguous",
            TokenType::GenomicDelins => "genomic_delins",
            TokenType::GenomicDuplication => "genomic_duplication",
            TokenType::GenomicDuplicationAmbiguous => "genomic_duplication_ambiguous",
            TokenType::GenomicInsertion => "genomic_insertion",
            TokenType::GenomicReferenceAgree => "genomic_reference_agree",
            TokenType::GenomicSubstitution => "genomic_substitution",
            TokenType::GnomadVcf => "gnomad_vcf",
            TokenType::Hgvs => "hgvs",
            TokenType::ProteinStopGain => "protein_stop_gain",
            TokenType::ProteinDeletion => "protein_deletion",
            TokenType::ProteinDelins => "protein_delins",
            TokenType::ProteinInsertion => "protein_insertion",
            TokenType::ProteinSubstitution => "protein_substitution",
            TokenType::ProteinReferenceAgree => "protein_reference_agree",
            TokenType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alteration types used when building VRS objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltType {
    Amplification,
    Deletion,
    DeletionAmbiguous,
    Delins,
    Duplication,
    DuplicationAmbiguous,
    Insertion,
    ReferenceAgree,
    Substitution,
    StopGain,
}

impl AltType {
    /// Ambiguous regions have no single-allele representation
    pub fn is_ambiguous_region(&self) -> bool {
        matches!(self, AltType::DeletionAmbiguous | AltType::DuplicationAmbiguous)
    }

    /// Deletion family (copy number goes down)
    pub fn is_deletion(&self) -> bool {
        matches!(self, AltType::Deletion | AltType::DeletionAmbiguous)
    }

    /// Alteration types the dup/del interpreter accepts
    pub fn is_dup_del(&self) -> bool {
        matches!(
            self,
            AltType::Deletion
                | AltType::DeletionAmbiguous
                | AltType::Duplication
                | AltType::DuplicationAmbiguous
        )
    }
}

/// Coordinate prefix of an HGVS expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateType {
    /// `c.`
    Coding,
    /// `g.`
    Genomic,
    /// `n.`
    NonCoding,
    /// `p.`
    Protein,
    /// `r.`
    Rna,
}

impl CoordinateType {
    /// Parse the single-letter prefix
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'c' => Some(CoordinateType::Coding),
            'g' => Some(CoordinateType::Genomic),
            'n' => Some(CoordinateType::NonCoding),
            'p' => Some(CoordinateType::Protein),
            'r' => Some(CoordinateType::Rna),
            _ => None,
        }
    }

    pub fn prefix(&self) -> char {
        match self {
            CoordinateType::Coding => 'c',
            CoordinateType::Genomic => 'g',
            CoordinateType::NonCoding => 'n',
            CoordinateType::Protein => 'p',
            CoordinateType::Rna => 'r',
        }
    }
}

/// A position in an ambiguous range: a residue number or the `?` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbiguousPos {
    Pos(u64),
    Unknown,
}

impl AmbiguousPos {
    /// Parse a regex capture: digits or `?`
    pub fn parse(text: &str) -> Option<Self> {
        if text == "?" {
            Some(AmbiguousPos::Unknown)
        } else {
            text.parse().ok().map(AmbiguousPos::Pos)
        }
    }

    pub fn value(&self) -> Option<u64> {
        match self {
            AmbiguousPos::Pos(p) => Some(*p),
            AmbiguousPos::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AmbiguousPos::Unknown)
    }
}

impl fmt::Display for AmbiguousPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmbiguousPos::Pos(p) => write!(f, "{}", p),
            AmbiguousPos::Unknown => write!(f, "?"),
        }
    }
}

// Serialized as a bare integer or the string "?"
impl Serialize for AmbiguousPos {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AmbiguousPos::Pos(p) => serializer.serialize_u64(*p),
            AmbiguousPos::Unknown => serializer.serialize_str("?"),
        }
    }
}

impl<'de> Deserialize<'de> for AmbiguousPos {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Pos(u64),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Pos(p) => Ok(AmbiguousPos::Pos(p)),
            Raw::Marker(m) if m == "?" => Ok(AmbiguousPos::Unknown),
            Raw::Marker(m) => Err(serde::de::Error::custom(format!(
                "expected position or '?', found {}",
                m
            ))),
        }
    }
}

/// Which of the three ambiguous-range regular shapes matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousShape {
    /// `(p0_p1)_(p2_p3)`
    BothBracketed,
    /// `(p0_p1)_p2`
    StartBracketed,
    /// `p0_(p2_p3)`
    EndBracketed,
}

/// A nucleotide or protein substitution payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    /// 1-based position of the substituted residue.
    pub pos: u64,
    /// Reference residue as written in the query.
    #[serde(rename = "ref")]
    pub ref_: String,
    /// Replacement residue.
    pub alt: String,
}

/// A deletion payload; `pos1` absent for a single residue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    /// First deleted residue, 1-based.
    pub pos0: u64,
    /// Last deleted residue when the deletion spans more than one.
    pub pos1: Option<u64>,
    /// Bases written after `del`, if any.
    pub deleted_sequence: Option<String>,
}

/// A deletion-insertion payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delins {
    /// First replaced residue, 1-based.
    pub pos0: u64,
    /// Last replaced residue; absent when only `pos0` is replaced.
    pub pos1: Option<u64>,
    /// Bases written after `delins`.
    pub inserted_sequence: String,
}

/// An insertion between `pos0` and `pos1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insertion {
    /// Residue on the left of the insertion point.
    pub pos0: u64,
    /// Residue on the right of the insertion point.
    pub pos1: u64,
    /// Bases written after `ins`.
    pub inserted_sequence: String,
}

/// A duplication payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duplication {
    /// First duplicated residue, 1-based.
    pub pos0: u64,
    /// Last duplicated residue; absent for a single-residue duplication.
    pub pos1: Option<u64>,
}

/// Bracketed duplication/deletion with partially known endpoints
///
/// The four slots follow `(pos0_pos1)_(pos2_pos3)`. Slots that a shape
/// does not bracket are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousRange {
    /// Outer bound of the start, possibly `?`.
    pub pos0: AmbiguousPos,
    /// Inner bound of the start; present only when the start is bracketed.
    pub pos1: Option<AmbiguousPos>,
    /// Inner bound of the end, or the end itself when it is not bracketed.
    pub pos2: AmbiguousPos,
    /// Outer bound of the end; present only when the end is bracketed.
    pub pos3: Option<AmbiguousPos>,
    /// Which bracket pattern the query used.
    pub shape: AmbiguousShape,
}

/// Protein span `aa0 pos0 [_ aa1 pos1]`, one-letter codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinSpan {
    /// One-letter code of the first residue.
    pub aa0: String,
    /// Position of the first residue, 1-based.
    pub pos0: u64,
    /// One-letter code of the last residue for a multi-residue span.
    pub aa1: Option<String>,
    /// Position of the last residue for a multi-residue span.
    pub pos1: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinDeletion {
    /// Deleted residues.
    #[serde(flatten)]
    pub span: ProteinSpan,
    /// One-letter residues written after `del`, if any.
    pub deleted_sequence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinDelins {
    /// Replaced residues.
    #[serde(flatten)]
    pub span: ProteinSpan,
    /// One-letter residues written after `delins`.
    pub inserted_sequence: String,
}

/// Protein insertion always names both flanking residues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinInsertion {
    /// One-letter code of the left flank.
    pub aa0: String,
    /// Position of the left flank.
    pub pos0: u64,
    /// One-letter code of the right flank.
    pub aa1: String,
    /// Position of the right flank.
    pub pos1: u64,
    /// One-letter residues written after `ins`.
    pub inserted_sequence: String,
}

/// `accession:coordinate.change`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HgvsToken {
    /// Versioned reference accession, e.g. `NC_000007.14`.
    pub accession: String,
    /// Coordinate system letter before the `.`.
    pub coordinate_type: CoordinateType,
    /// Everything after the coordinate letter and `.`, e.g. `140753336A>T`.
    pub change: String,
}

/// `chr-pos-ref-alt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GnomadVcfToken {
    /// Chromosome with a `chr` prefix, e.g. `chr7`.
    pub chromosome: String,
    /// 1-based position of the first reference base.
    pub pos: u64,
    /// Reference bases, upper-cased.
    #[serde(rename = "ref")]
    pub ref_: String,
    /// Alternate bases, upper-cased.
    pub alt: String,
}

/// Type-specific token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "token_type", rename_all = "snake_case")]
pub enum TokenPayload {
    Gene { symbol: String },
    Hgvs(HgvsToken),
    GnomadVcf(GnomadVcfToken),
    Amplification,
    ProteinSubstitution(Substitution),
    ProteinStopGain(Substitution),
    ProteinReferenceAgree {
        pos: u64,
        #[serde(rename = "ref")]
        ref_: String,
    },
    ProteinDeletion(ProteinDeletion),
    ProteinDelins(ProteinDelins),
    ProteinInsertion(ProteinInsertion),
    CdnaSubstitution(Substitution),
    CdnaReferenceAgree { pos: u64 },
    CdnaDeletion(Deletion),
    CdnaDelins(Delins),
    CdnaInsertion(Insertion),
    GenomicSubstitution(Substitution),
    GenomicReferenceAgree { pos: u64 },
    GenomicDeletion(Deletion),
    GenomicDelins(Delins),
    GenomicInsertion(Insertion),
    GenomicDuplication(Duplication),
    GenomicDeletionAmbiguous(AmbiguousRange),
    GenomicDuplicationAmbiguous(AmbiguousRange),
    Unknown,
}

impl TokenPayload {
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenPayload::Gene { .. } => TokenType::Gene,
            TokenPayload::Hgvs(_) => TokenType::Hgvs,
            TokenPayload::GnomadVcf(_) => TokenType::GnomadVcf,
            TokenPayload::Amplification => TokenType::Amplification,
            TokenPayload::ProteinSubstitution(_) => TokenType::ProteinSubstitution,
            TokenPayload::ProteinStopGain(_) => TokenType::ProteinStopGain,
            TokenPayload::ProteinReferenceAgree { .. } => TokenType::ProteinReferenceAgree,
            TokenPayload::ProteinDeletion(_) => TokenType::ProteinDeletion,
            TokenPayload::ProteinDelins(_) => TokenType::ProteinDelins,
            TokenPayload::ProteinInsertion(_) => TokenType::ProteinInsertion,
            TokenPayload::CdnaSubstitution(_) => TokenType::CdnaSubstitution,
            TokenPayload::CdnaReferenceAgree { .. } => TokenType::CdnaReferenceAgree,
            TokenPayload::CdnaDeletion(_) => TokenType::CdnaDeletion,
            TokenPayload::CdnaDelins(_) => TokenType::CdnaDelins,
            TokenPayload::CdnaInsertion(_) => TokenType::CdnaInsertion,
            TokenPayload::GenomicSubstitution(_) => TokenType::GenomicSubstitution,
            TokenPayload::GenomicReferenceAgree { .. } => TokenType::GenomicReferenceAgree,
            TokenPayload::GenomicDeletion(_) => TokenType::GenomicDeletion,
            TokenPayload::GenomicDelins(_) => TokenType::GenomicDelins,
            TokenPayload::GenomicInsertion(_) => TokenType::GenomicInsertion,
            TokenPayload::GenomicDuplication(_) => TokenType::GenomicDuplication,
            TokenPayload::GenomicDeletionAmbiguous(_) => TokenType::GenomicDeletionAmbiguous,
            TokenPayload::GenomicDuplicationAmbiguous(_) => {
                TokenType::GenomicDuplicationAmbiguous
            }
            TokenPayload::Unknown => TokenType::Unknown,
        }
    }
}

/// One lexical unit of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The term exactly as it appeared in the input
    pub input: String,
    /// The term with coordinate prefixes and brackets stripped
    pub normalized: String,
    /// Token type and its parsed fields.
    #[serde(flatten)]
    pub payload: TokenPayload,
}

impl Token {
    pub fn new(input: impl Into<String>, normalized: impl Into<String>, payload: TokenPayload) -> Self {
        Self {
            input: input.into(),
            normalized: normalized.into(),
            payload,
        }
    }

    pub fn token_type(&self) -> TokenType {
        self.payload.token_type()
    }

    /// Gene symbol if this is a gene token
    pub fn gene_symbol(&self) -> Option<&str> {
        match &self.payload {
            TokenPayload::Gene { symbol } => Some(symbol),
            _ => None,
        }
    }
}
