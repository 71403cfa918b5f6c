//! GA4GH VRS 2.x object model
//!
//! Objects serialize with camelCase keys and a `"type"` discriminator, the
//! same shape VRS consumers expect. Identifiers are `None` until
//! [`identify`](super::digest::identify) assigns them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position that is either exact or an interval of possible values
///
/// A range bound of `None` is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(u64),
    Range([Option<u64>; 2]),
}

impl Coordinate {
    pub fn number(&self) -> Option<u64> {
        match self {
            Coordinate::Number(n) => Some(*n),
            Coordinate::Range(_) => None,
        }
    }
}

impl From<u64> for Coordinate {
    fn from(value: u64) -> Self {
        Coordinate::Number(value)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: &Option<u64>| b.map(|v| v.to_string()).unwrap_or_else(|| "null".into());
        match self {
            Coordinate::Number(n) => write!(f, "{}", n),
            Coordinate::Range([lo, hi]) => write!(f, "[{}, {}]", bound(lo), bound(hi)),
        }
    }
}

/// Reference to a sequence by its refget accession (`SQ.` + digest)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct SequenceReference {
    pub refget_accession: String,
}

impl SequenceReference {
    /// Build from either a bare `SQ.` accession or a `ga4gh:SQ.` identifier
    pub fn new(accession: &str) -> Self {
        Self {
            refget_accession: accession.trim_start_matches("ga4gh:").to_string(),
        }
    }
}

/// Inter-residue location on a reference sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct SequenceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub sequence_reference: SequenceReference,
    pub start: Coordinate,
    pub end: Coordinate,
    /// Reference sequence over the location, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

impl SequenceLocation {
    pub fn new(refget_accession: &str, start: impl Into<Coordinate>, end: impl Into<Coordinate>) -> Self {
        Self {
            id: None,
            digest: None,
            sequence_reference: SequenceReference::new(refget_accession),
            start: start.into(),
            end: end.into(),
            sequence: None,
        }
    }

    pub fn refget_accession(&self) -> &str {
        &self.sequence_reference.refget_accession
    }

    /// Exact interval, if both bounds are numbers
    pub fn interval(&self) -> Option<(u64, u64)> {
        Some((self.start.number()?, self.end.number()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct LiteralSequenceExpression {
    pub sequence: String,
}

impl LiteralSequenceExpression {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
        }
    }
}

/// A sequence state at a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allele {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub location: SequenceLocation,
    pub state: LiteralSequenceExpression,
}

impl Allele {
    pub fn new(location: SequenceLocation, state: impl Into<String>) -> Self {
        Self {
            id: None,
            digest: None,
            location,
            state: LiteralSequenceExpression::new(state),
        }
    }
}

/// Absolute copy count over a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyNumberCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub location: SequenceLocation,
    pub copies: Coordinate,
}

/// Relative copy change over a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyNumberChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub location: SequenceLocation,
    pub copy_change: CopyChange,
}

/// Any variation this crate produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Variation {
    Allele(Allele),
    CopyNumberCount(CopyNumberCount),
    CopyNumberChange(CopyNumberChange),
}

impl Variation {
    pub fn id(&self) -> Option<&str> {
        match self {
            Variation::Allele(v) => v.id.as_deref(),
            Variation::CopyNumberCount(v) => v.id.as_deref(),
            Variation::CopyNumberChange(v) => v.id.as_deref(),
        }
    }

    pub fn location(&self) -> &SequenceLocation {
        match self {
            Variation::Allele(v) => &v.location,
            Variation::CopyNumberCount(v) => &v.location,
            Variation::CopyNumberChange(v) => &v.location,
        }
    }

    pub fn location_mut(&mut self) -> &mut SequenceLocation {
        match self {
            Variation::Allele(v) => &mut v.location,
            Variation::CopyNumberCount(v) => &mut v.location,
            Variation::CopyNumberChange(v) => &mut v.location,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Variation::Allele(_) => "Allele",
            Variation::CopyNumberCount(_) => "CopyNumberCount",
            Variation::CopyNumberChange(_) => "CopyNumberChange",
        }
    }
}

/// EFO terms for relative copy change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CopyChange {
    #[serde(rename = "efo:0030069")]
    CompleteGenomicLoss,
    #[serde(rename = "efo:0020073")]
    HighLevelLoss,
    #[serde(rename = "efo:0030067")]
    Loss,
    #[serde(rename = "efo:0030068")]
    LowLevelLoss,
    #[serde(rename = "efo:0030064")]
    RegionalBasePloidy,
    #[serde(rename = "efo:0030071")]
    LowLevelGain,
    #[serde(rename = "efo:0030070")]
    Gain,
    #[serde(rename = "efo:0030072")]
    HighLevelGain,
}

impl CopyChange {
    pub const ALL: [CopyChange; 8] = [
        CopyChange::CompleteGenomicLoss,
        CopyChange::HighLevelLoss,
        CopyChange::Loss,
        CopyChange::LowLevelLoss,
        CopyChange::RegionalBasePloidy,
        CopyChange::LowLevelGain,
        CopyChange::Gain,
        CopyChange::HighLevelGain,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            CopyChange::CompleteGenomicLoss => "efo:0030069",
            CopyChange::HighLevelLoss => "efo:0020073",
            CopyChange::Loss => "efo:0030067",
            CopyChange::LowLevelLoss => "efo:0030068",
            CopyChange::RegionalBasePloidy => "efo:0030064",
            CopyChange::LowLevelGain => "efo:0030071",
            CopyChange::Gain => "efo:0030070",
            CopyChange::HighLevelGain => "efo:0030072",
        }
    }

    /// Parse an EFO code such as `efo:0030067`
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for CopyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
