//! Duplication/deletion interpretation
//!
//! Chooses which kind of VRS variation a duplication or deletion becomes.
//!
//! | Mode | Result |
//! |------|--------|
//! | `allele` | normalized literal Allele; nothing for ambiguous regions |
//! | `copy_number_count` | CopyNumberCount, `baseline - 1` for losses, `baseline + 1` for gains |
//! | `copy_number_change` | CopyNumberChange, loss/gain unless a copy change is given |
//! | `default` | change for ambiguous regions without a baseline, count with a baseline, else allele |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::QueryContext;
use crate::error::FerroError;
use crate::reference::ResidueMode;
use crate::token::AltType;
use crate::vrs::{
    identify, Allele, Coordinate, CopyChange, CopyNumberChange, CopyNumberCount,
    SequenceLocation, Variation,
};

/// How duplications and deletions are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DupDelMode {
    #[default]
    Default,
    Allele,
    CopyNumberCount,
    CopyNumberChange,
}

impl fmt::Display for DupDelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DupDelMode::Default => write!(f, "default"),
            DupDelMode::Allele => write!(f, "allele"),
            DupDelMode::CopyNumberCount => write!(f, "copy_number_count"),
            DupDelMode::CopyNumberChange => write!(f, "copy_number_change"),
        }
    }
}

impl std::str::FromStr for DupDelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(DupDelMode::Default),
            "allele" => Ok(DupDelMode::Allele),
            "copy_number_count" | "cnc" => Ok(DupDelMode::CopyNumberCount),
            "copy_number_change" | "cx" => Ok(DupDelMode::CopyNumberChange),
            _ => Err(format!("Invalid dup/del mode: {}", s)),
        }
    }
}

fn require_dup_del(alt_type: AltType) -> Result<(), FerroError> {
    if alt_type.is_dup_del() {
        Ok(())
    } else {
        Err(FerroError::UnsupportedVariant {
            variant_type: format!("{:?} as a duplication or deletion", alt_type),
        })
    }
}

/// Copy number count for a duplication or deletion
pub fn copy_number_count(
    alt_type: AltType,
    location: SequenceLocation,
    baseline_copies: u64,
) -> Result<Variation, FerroError> {
    require_dup_del(alt_type)?;
    let copies = if alt_type.is_deletion() {
        baseline_copies
            .checked_sub(1)
            .ok_or_else(|| FerroError::InvalidCoordinates {
                msg: "baseline_copies must be at least 1 for a deletion".to_string(),
            })?
    } else {
        baseline_copies
            .checked_add(1)
            .ok_or_else(|| FerroError::InvalidCoordinates {
                msg: format!("baseline_copies ({}) is too large", baseline_copies),
            })?
    };
    let mut variation = Variation::CopyNumberCount(CopyNumberCount {
        id: None,
        digest: None,
        location,
        copies: Coordinate::Number(copies),
    });
    identify(&mut variation);
    Ok(variation)
}

/// Copy number change; loss for deletions and gain for duplications by default
pub fn copy_number_change(
    alt_type: AltType,
    location: SequenceLocation,
    copy_change: Option<CopyChange>,
) -> Result<Variation, FerroError> {
    require_dup_del(alt_type)?;
    let copy_change = copy_change.unwrap_or(if alt_type.is_deletion() {
        CopyChange::Loss
    } else {
        CopyChange::Gain
    });
    let mut variation = Variation::CopyNumberChange(CopyNumberChange {
        id: None,
        digest: None,
        label: None,
        location,
        copy_change,
    });
    identify(&mut variation);
    Ok(variation)
}

/// Optional inputs to [`DupDelModeInterpreter::interpret`]
#[derive(Debug, Clone, Default)]
pub struct DupDelParams {
    pub baseline_copies: Option<u64>,
    pub copy_change: Option<CopyChange>,
    /// Asserted state for deletions, if any
    pub alt: Option<String>,
}

/// Mode-driven builder; allele mode needs the reference and the normalizer
pub struct DupDelModeInterpreter<'a> {
    ctx: &'a QueryContext,
}

impl<'a> DupDelModeInterpreter<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    /// Build a variation, recording why nothing was built in `warnings`
    pub async fn interpret(
        &self,
        mode: DupDelMode,
        alt_type: AltType,
        location: SequenceLocation,
        accession: &str,
        params: &DupDelParams,
        warnings: &mut Vec<String>,
    ) -> Option<Variation> {
        let result = match mode {
            DupDelMode::Default => self.default_mode(alt_type, location, accession, params).await,
            DupDelMode::Allele => {
                self.allele_mode(alt_type, location, accession, params.alt.as_deref())
                    .await
            }
            DupDelMode::CopyNumberCount => match params.baseline_copies {
                Some(baseline) => copy_number_count(alt_type, location, baseline).map(Some),
                None => Err(FerroError::MissingParameter {
                    parameter: "baseline_copies".to_string(),
                    context: "Copy Number Count Variation".to_string(),
                }),
            },
            DupDelMode::CopyNumberChange => {
                copy_number_change(alt_type, location, params.copy_change).map(Some)
            }
        };

        match result {
            Ok(Some(variation)) => Some(variation),
            Ok(None) => {
                warnings.push("Unable to get VRS Variation".to_string());
                None
            }
            Err(e) => {
                tracing::debug!(%mode, ?alt_type, error = %e, "dup/del interpretation failed");
                warnings.push(e.to_string());
                warnings.push("Unable to get VRS Variation".to_string());
                None
            }
        }
    }

    pub async fn default_mode(
        &self,
        alt_type: AltType,
        location: SequenceLocation,
        accession: &str,
        params: &DupDelParams,
    ) -> Result<Option<Variation>, FerroError> {
        require_dup_del(alt_type)?;
        match params.baseline_copies {
            None if alt_type.is_ambiguous_region() => {
                copy_number_change(alt_type, location, params.copy_change).map(Some)
            }
            // a zero baseline counts as absent
            Some(baseline) if baseline > 0 => {
                copy_number_count(alt_type, location, baseline).map(Some)
            }
            _ => {
                self.allele_mode(alt_type, location, accession, params.alt.as_deref())
                    .await
            }
        }
    }

    /// Normalized literal allele. `None` for ambiguous regions and when the
    /// reference or normalization is unavailable.
    pub async fn allele_mode(
        &self,
        alt_type: AltType,
        location: SequenceLocation,
        accession: &str,
        alt: Option<&str>,
    ) -> Result<Option<Variation>, FerroError> {
        if alt_type.is_ambiguous_region() {
            return Ok(None);
        }
        let Some((start, end)) = location.interval() else {
            return Ok(None);
        };

        let state = if alt_type == AltType::Duplication {
            match self
                .ctx
                .get_reference_sequence(accession, Some(start), Some(end), ResidueMode::InterResidue)
                .await
            {
                Ok(reference) => reference.repeat(2),
                Err(e) => {
                    tracing::debug!(accession, error = %e, "no reference for duplication");
                    return Ok(None);
                }
            }
        } else {
            alt.unwrap_or_default().to_string()
        };

        match self
            .ctx
            .normalize_allele(Allele::new(location, state), accession)
            .await
        {
            Ok(allele) => {
                let mut variation = Variation::Allele(allele);
                identify(&mut variation);
                Ok(Some(variation))
            }
            Err(e) => {
                tracing::debug!(accession, error = %e, "allele normalization failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::MockProvider;
    use crate::vrs::sequence_identifier;
    use std::sync::Arc;

    const SEQUENCE: &str = "GGCACACATTG";

    fn context() -> QueryContext {
        let mut provider = MockProvider::new();
        provider.add_sequence("NC_000013.11", SEQUENCE);
        QueryContext::from_provider(Arc::new(provider))
    }

    fn location(start: u64, end: u64) -> SequenceLocation {
        SequenceLocation::new(&sequence_identifier(SEQUENCE), start, end)
    }

    fn ambiguous_location() -> SequenceLocation {
        SequenceLocation::new(
            &sequence_identifier(SEQUENCE),
            Coordinate::Range([None, Some(2)]),
            Coordinate::Range([Some(6), None]),
        )
    }

    #[test]
    fn test_copy_number_count_arithmetic() {
        let del = copy_number_count(AltType::Deletion, location(2, 4), 3).unwrap();
        let dup = copy_number_count(AltType::Duplication, location(2, 4), 3).unwrap();
        match (del, dup) {
            (Variation::CopyNumberCount(del), Variation::CopyNumberCount(dup)) => {
                assert_eq!(del.copies, Coordinate::Number(2));
                assert_eq!(dup.copies, Coordinate::Number(4));
                assert!(dup.id.unwrap().starts_with("ga4gh:CN."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_copy_number_count_rejects_out_of_range_baseline() {
        assert!(copy_number_count(AltType::Deletion, location(2, 4), 0).is_err());
        assert!(copy_number_count(AltType::Duplication, location(2, 4), u64::MAX).is_err());
    }

    #[test]
    fn test_copy_number_change_defaults() {
        let loss = copy_number_change(AltType::DeletionAmbiguous, ambiguous_location(), None).unwrap();
        let gain = copy_number_change(AltType::Duplication, location(2, 4), None).unwrap();
        let explicit =
            copy_number_change(AltType::Duplication, location(2, 4), Some(CopyChange::HighLevelGain))
                .unwrap();
        let change = |v: Variation| match v {
            Variation::CopyNumberChange(cx) => cx.copy_change,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(change(loss), CopyChange::Loss);
        assert_eq!(change(gain), CopyChange::Gain);
        assert_eq!(change(explicit), CopyChange::HighLevelGain);
    }

    #[test]
    fn test_rejects_non_dup_del() {
        assert!(copy_number_change(AltType::Substitution, location(2, 3), None).is_err());
    }

    #[tokio::test]
    async fn test_default_mode_dispatch() {
        let ctx = context();
        let interpreter = DupDelModeInterpreter::new(&ctx);

        let ambiguous = interpreter
            .default_mode(AltType::DuplicationAmbiguous, ambiguous_location(), "NC_000013.11", &DupDelParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ambiguous.type_name(), "CopyNumberChange");

        let with_baseline = DupDelParams {
            baseline_copies: Some(2),
            ..Default::default()
        };
        let counted = interpreter
            .default_mode(AltType::DuplicationAmbiguous, ambiguous_location(), "NC_000013.11", &with_baseline)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counted.type_name(), "CopyNumberCount");

        let allele = interpreter
            .default_mode(AltType::Duplication, location(2, 4), "NC_000013.11", &DupDelParams::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(allele.type_name(), "Allele");
    }

    #[tokio::test]
    async fn test_default_mode_zero_baseline_builds_allele() {
        let ctx = context();
        let interpreter = DupDelModeInterpreter::new(&ctx);
        let zero = DupDelParams {
            baseline_copies: Some(0),
            ..Default::default()
        };
        for alt_type in [AltType::Duplication, AltType::Deletion] {
            let variation = interpreter
                .default_mode(alt_type, location(2, 4), "NC_000013.11", &zero)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(variation.type_name(), "Allele");
        }

        // ambiguous regions have no allele form
        let ambiguous = interpreter
            .default_mode(AltType::DeletionAmbiguous, ambiguous_location(), "NC_000013.11", &zero)
            .await
            .unwrap();
        assert!(ambiguous.is_none());
    }

    #[tokio::test]
    async fn test_allele_mode_duplication_is_normalized() {
        let ctx = context();
        let interpreter = DupDelModeInterpreter::new(&ctx);
        // dup of "CA" at 2..4 in GG|CACACA|TTG expands across the repeat
        let variation = interpreter
            .allele_mode(AltType::Duplication, location(2, 4), "NC_000013.11", None)
            .await
            .unwrap()
            .unwrap();
        match variation {
            Variation::Allele(allele) => {
                assert_eq!(allele.location.interval(), Some((2, 8)));
                assert_eq!(allele.state.sequence, "CACACACA");
                assert!(allele.id.unwrap().starts_with("ga4gh:VA."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_allele_mode_fails_closed_for_ambiguous() {
        let ctx = context();
        let interpreter = DupDelModeInterpreter::new(&ctx);
        let result = interpreter
            .allele_mode(AltType::DeletionAmbiguous, ambiguous_location(), "NC_000013.11", None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_interpret_missing_baseline() {
        let ctx = context();
        let interpreter = DupDelModeInterpreter::new(&ctx);
        let mut warnings = Vec::new();
        let result = interpreter
            .interpret(
                DupDelMode::CopyNumberCount,
                AltType::Duplication,
                location(2, 4),
                "NC_000013.11",
                &DupDelParams::default(),
                &mut warnings,
            )
            .await;
        assert!(result.is_none());
        assert_eq!(
            warnings,
            vec![
                "baseline_copies must be provided for Copy Number Count Variation",
                "Unable to get VRS Variation"
            ]
        );
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("copy_number_count".parse::<DupDelMode>().unwrap(), DupDelMode::CopyNumberCount);
        assert_eq!(DupDelMode::Allele.to_string(), "allele");
        assert!("bogus".parse::<DupDelMode>().is_err());
    }
}
