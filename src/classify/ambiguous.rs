//! Ambiguous range resolution
//!
//! A pure lookup from (regex shape, which positions are `?`) to an
//! [`AmbiguousType`]. Shapes whose meaning is not defined are reported as
//! unsupported instead of being mapped to the nearest supported pattern.

use crate::classify::types::{AmbiguousResolution, AmbiguousType};
use crate::token::{AmbiguousPos, AmbiguousRange, AmbiguousShape};

/// Resolver for bracketed duplication/deletion positions
pub struct AmbiguousRangeResolver;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Int,
    Unknown,
    Absent,
}

fn slot(pos: Option<AmbiguousPos>) -> Slot {
    match pos {
        Some(AmbiguousPos::Pos(_)) => Slot::Int,
        Some(AmbiguousPos::Unknown) => Slot::Unknown,
        None => Slot::Absent,
    }
}

impl AmbiguousRangeResolver {
    /// Classify an ambiguous range.
    ///
    /// Total and deterministic: every input yields exactly one outcome.
    pub fn resolve(range: &AmbiguousRange) -> AmbiguousResolution {
        use Slot::{Absent, Int, Unknown};

        let slots = (
            slot(Some(range.pos0)),
            slot(range.pos1),
            slot(Some(range.pos2)),
            slot(range.pos3),
        );

        let (supported, unsupported) = match range.shape {
            AmbiguousShape::BothBracketed => match slots {
                (Int, Int, Int, Int) => (Some(AmbiguousType::Ambiguous1), None),
                (Unknown, Int, Int, Unknown) => (Some(AmbiguousType::Ambiguous2), None),
                (Int, Unknown, Unknown, Int) => (None, Some(AmbiguousType::Ambiguous3)),
                _ => (None, None),
            },
            AmbiguousShape::StartBracketed => match slots {
                (Unknown, Int, Int, Absent) => (Some(AmbiguousType::Ambiguous5), None),
                (Int, Int, Int, Absent) => (None, Some(AmbiguousType::Ambiguous4)),
                _ => (None, None),
            },
            AmbiguousShape::EndBracketed => match slots {
                (Int, Absent, Int, Unknown) => (Some(AmbiguousType::Ambiguous7), None),
                (Int, Absent, Int, Int) => (None, Some(AmbiguousType::Ambiguous6)),
                _ => (None, None),
            },
        };

        match supported {
            Some(ambiguous_type) => AmbiguousResolution::Supported { ambiguous_type },
            None => AmbiguousResolution::Unsupported { shape: unsupported },
        }
    }

    /// Render the range as a `#`/`?` pattern such as `(#_?)_(?_#)`
    pub fn pattern(range: &AmbiguousRange) -> String {
        let mark = |p: AmbiguousPos| if p.is_unknown() { '?' } else { '#' };
        let pair = |a: AmbiguousPos, b: Option<AmbiguousPos>| match b {
            Some(b) => format!("({}_{})", mark(a), mark(b)),
            None => mark(a).to_string(),
        };
        match range.shape {
            AmbiguousShape::EndBracketed => {
                format!("{}_({}_{})", mark(range.pos0), mark(range.pos2), range.pos3.map_or('#', mark))
            }
            _ => format!("{}_{}", pair(range.pos0, range.pos1), pair(range.pos2, range.pos3)),
        }
    }
}
