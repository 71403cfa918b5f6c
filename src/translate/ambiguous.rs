//! Sequence locations for ambiguous duplication/deletion ranges
//!
//! Residue positions become inter-residue ranges; an unknown bound becomes an
//! open side of the range.
//!
//! | Type | start | end |
//! |------|-------|-----|
//! | `(#_#)_(#_#)` | `[p0-1, p1-1]` | `[p2, p3]` |
//! | `(?_#)_(#_?)` | `[null, p1-1]` | `[p2, null]` |
//! | `(?_#)_#` | `[null, p1-1]` | `p2` |
//! | `#_(#_?)` | `p0-1` | `[p2, null]` |

use crate::classify::AmbiguousType;
use crate::token::AmbiguousRange;
use crate::vrs::{Coordinate, SequenceLocation};

/// The four positions of an ambiguous range, `None` where unknown or absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbiguousPositions {
    pub pos0: Option<u64>,
    pub pos1: Option<u64>,
    pub pos2: Option<u64>,
    pub pos3: Option<u64>,
}

impl AmbiguousPositions {
    pub fn from_range(range: &AmbiguousRange) -> Self {
        Self {
            pos0: range.pos0.value(),
            pos1: range.pos1.and_then(|p| p.value()),
            pos2: range.pos2.value(),
            pos3: range.pos3.and_then(|p| p.value()),
        }
    }

    pub fn to_vec(self) -> Vec<Option<u64>> {
        vec![self.pos0, self.pos1, self.pos2, self.pos3]
    }

    /// Rebuild from the order produced by [`to_vec`](Self::to_vec)
    pub fn from_slice(positions: &[Option<u64>]) -> Option<Self> {
        match positions {
            [pos0, pos1, pos2, pos3] => Some(Self {
                pos0: *pos0,
                pos1: *pos1,
                pos2: *pos2,
                pos3: *pos3,
            }),
            _ => None,
        }
    }
}

fn inter_residue(pos: Option<u64>) -> Option<u64> {
    pos.and_then(|p| p.checked_sub(1))
}

/// Location for a supported ambiguous type; `None` if a required position
/// is missing
pub fn ambiguous_location(
    refget_accession: &str,
    ambiguous_type: AmbiguousType,
    positions: AmbiguousPositions,
) -> Option<SequenceLocation> {
    let AmbiguousPositions {
        pos0,
        pos1,
        pos2,
        pos3,
    } = positions;

    let (start, end) = match ambiguous_type {
        AmbiguousType::Ambiguous1 => (
            Coordinate::Range([Some(inter_residue(pos0)?), Some(inter_residue(pos1)?)]),
            Coordinate::Range([Some(pos2?), Some(pos3?)]),
        ),
        AmbiguousType::Ambiguous2 => (
            Coordinate::Range([None, Some(inter_residue(pos1)?)]),
            Coordinate::Range([Some(pos2?), None]),
        ),
        AmbiguousType::Ambiguous5 => (
            Coordinate::Range([None, Some(inter_residue(pos1)?)]),
            Coordinate::Number(pos2?),
        ),
        AmbiguousType::Ambiguous7 => (
            Coordinate::Number(inter_residue(pos0)?),
            Coordinate::Range([Some(pos2?), None]),
        ),
        AmbiguousType::Ambiguous3 | AmbiguousType::Ambiguous4 | AmbiguousType::Ambiguous6 => {
            return None
        }
    };
    Some(SequenceLocation::new(refget_accession, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(pos0: Option<u64>, pos1: Option<u64>, pos2: Option<u64>, pos3: Option<u64>) -> AmbiguousPositions {
        AmbiguousPositions {
            pos0,
            pos1,
            pos2,
            pos3,
        }
    }

    #[test]
    fn test_ambiguous_2_location() {
        let loc = ambiguous_location(
            "SQ.x",
            AmbiguousType::Ambiguous2,
            positions(None, Some(63845873), Some(63851771), None),
        )
        .unwrap();
        assert_eq!(loc.start, Coordinate::Range([None, Some(63845872)]));
        assert_eq!(loc.end, Coordinate::Range([Some(63851771), None]));
        assert_eq!(loc.interval(), None);
    }

    #[test]
    fn test_definite_and_half_open_types() {
        let amb1 = ambiguous_location(
            "SQ.x",
            AmbiguousType::Ambiguous1,
            positions(Some(10), Some(20), Some(30), Some(40)),
        )
        .unwrap();
        assert_eq!(amb1.start, Coordinate::Range([Some(9), Some(19)]));
        assert_eq!(amb1.end, Coordinate::Range([Some(30), Some(40)]));

        let amb5 = ambiguous_location(
            "SQ.x",
            AmbiguousType::Ambiguous5,
            positions(None, Some(20), Some(30), None),
        )
        .unwrap();
        assert_eq!(amb5.end, Coordinate::Number(30));

        let amb7 = ambiguous_location(
            "SQ.x",
            AmbiguousType::Ambiguous7,
            positions(Some(10), None, Some(30), None),
        )
        .unwrap();
        assert_eq!(amb7.start, Coordinate::Number(9));
        assert_eq!(amb7.end, Coordinate::Range([Some(30), None]));
    }

    #[test]
    fn test_unsupported_types_have_no_location() {
        let all = positions(Some(1), Some(2), Some(3), Some(4));
        for t in [
            AmbiguousType::Ambiguous3,
            AmbiguousType::Ambiguous4,
            AmbiguousType::Ambiguous6,
        ] {
            assert!(ambiguous_location("SQ.x", t, all).is_none());
        }
        // missing required position
        assert!(ambiguous_location("SQ.x", AmbiguousType::Ambiguous1, positions(Some(1), None, Some(3), Some(4))).is_none());
    }
}
