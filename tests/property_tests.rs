//! Property-based tests for ordering checks, ambiguous range resolution,
//! accession selection, normalization and copy number arithmetic

use ferro_vrs::classify::ambiguous::AmbiguousRangeResolver;
use ferro_vrs::classify::{
    AmbiguousResolution, AmbiguousType, Classification, ClassifiedVariant, Nomenclature,
};
use ferro_vrs::reference::TranscriptPriority;
use ferro_vrs::token::{AltType, AmbiguousPos, AmbiguousRange, AmbiguousShape};
use ferro_vrs::translate::dup_del::copy_number_count;
use ferro_vrs::translate::{AccessionPrioritizer, TranslationResult};
use ferro_vrs::validate::checks::five_prime_to_three_prime;
use ferro_vrs::validate::ValidationResult;
use ferro_vrs::vrs::normalize::justify;
use ferro_vrs::vrs::{Allele, Coordinate, SequenceLocation};
use ferro_vrs::Variation;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

// =============================================================================
// Strategies
// =============================================================================

/// Low-complexity sequences so repeats are common
fn repetitive_sequence() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(b'A'), Just(b'C'), Just(b'G')], 4..40)
}

fn short_allele() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(b'A'), Just(b'C'), Just(b'G')], 0..4)
}

/// Sequence with a valid half-open interval and a replacement allele
fn edit() -> impl Strategy<Value = (Vec<u8>, usize, usize, Vec<u8>)> {
    repetitive_sequence()
        .prop_flat_map(|seq| {
            let len = seq.len();
            (Just(seq), 0..=len)
        })
        .prop_flat_map(|(seq, start)| {
            let len = seq.len();
            (Just(seq), Just(start), start..=len.min(start + 4), short_allele())
        })
}

fn priority() -> impl Strategy<Value = TranscriptPriority> {
    prop_oneof![
        Just(TranscriptPriority::ManeSelect),
        Just(TranscriptPriority::ManePlusClinical),
        Just(TranscriptPriority::LongestCompatibleRemaining),
        Just(TranscriptPriority::Grch38),
        Just(TranscriptPriority::Na),
    ]
}

/// (status, kept original accession, original version)
fn candidate() -> impl Strategy<Value = (TranscriptPriority, bool, u32)> {
    (priority(), any::<bool>(), 1..5u32)
}

fn translation(index: usize, (status, kept, version): (TranscriptPriority, bool, u32)) -> TranslationResult {
    let og = format!("NM_{:06}.{}", index, version);
    let vrs = if kept { og.clone() } else { format!("NM_9{:05}.1", index) };
    let classification = Classification {
        matching_tokens: Vec::new(),
        nomenclature: Nomenclature::Hgvs,
        gene: None,
        accession: Some(og.clone()),
        variant: ClassifiedVariant::Amplification,
    };
    TranslationResult {
        vrs_variation: Variation::Allele(Allele::new(SequenceLocation::new("SQ.x", 1, 2), "A")),
        vrs_seq_loc_ac: Some(vrs),
        vrs_seq_loc_ac_status: status,
        og_ac: Some(og.clone()),
        validation_result: ValidationResult {
            accession: Some(og),
            cds_start: None,
            classification,
            is_valid: true,
            errors: Vec::new(),
        },
    }
}

fn selection_key(
    r: &TranslationResult,
) -> (
    TranscriptPriority,
    bool,
    std::cmp::Reverse<String>,
    std::cmp::Reverse<u32>,
) {
    let kept = r.og_ac == r.vrs_seq_loc_ac;
    let (name, version) = r
        .og_ac
        .as_deref()
        .and_then(|ac| ac.rsplit_once('.'))
        .map(|(name, v)| (name.to_string(), v.parse().unwrap_or(0)))
        .unwrap_or_default();
    (
        r.vrs_seq_loc_ac_status,
        !kept,
        std::cmp::Reverse(name),
        std::cmp::Reverse(version),
    )
}

// =============================================================================
// Ordering
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_increasing_positions_pass(set in prop::collection::btree_set(1..1_000_000u64, 0..5)) {
        let mut positions: Vec<u64> = set.into_iter().collect();
        prop_assert!(five_prime_to_three_prime(&positions).is_none());
        if positions.len() >= 2 {
            positions.reverse();
            prop_assert!(five_prime_to_three_prime(&positions).is_some());
        }
    }

    #[test]
    fn prop_repeated_position_fails(pos in 1..1_000_000u64) {
        prop_assert!(five_prime_to_three_prime(&[pos, pos]).is_some());
    }
}

// =============================================================================
// Ambiguous ranges
// =============================================================================

fn ambiguous_pos() -> impl Strategy<Value = AmbiguousPos> {
    prop_oneof![
        Just(AmbiguousPos::Unknown),
        (1..1_000_000u64).prop_map(AmbiguousPos::Pos),
    ]
}

fn ambiguous_range() -> impl Strategy<Value = AmbiguousRange> {
    (
        ambiguous_pos(),
        ambiguous_pos(),
        ambiguous_pos(),
        ambiguous_pos(),
        prop_oneof![
            Just(AmbiguousShape::BothBracketed),
            Just(AmbiguousShape::StartBracketed),
            Just(AmbiguousShape::EndBracketed),
        ],
    )
        .prop_map(|(pos0, pos1, pos2, pos3, shape)| AmbiguousRange {
            pos0,
            pos1: (shape != AmbiguousShape::EndBracketed).then_some(pos1),
            pos2,
            pos3: (shape != AmbiguousShape::StartBracketed).then_some(pos3),
            shape,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_resolver_is_deterministic(range in ambiguous_range()) {
        prop_assert_eq!(
            AmbiguousRangeResolver::resolve(&range),
            AmbiguousRangeResolver::resolve(&range.clone())
        );
    }

    #[test]
    fn prop_resolver_never_guesses_unsupported_shapes(range in ambiguous_range()) {
        let resolution = AmbiguousRangeResolver::resolve(&range);
        if let AmbiguousResolution::Supported { ambiguous_type } = resolution {
            prop_assert!(matches!(
                ambiguous_type,
                AmbiguousType::Ambiguous1
                    | AmbiguousType::Ambiguous2
                    | AmbiguousType::Ambiguous5
                    | AmbiguousType::Ambiguous7
            ));
            prop_assert_eq!(
                AmbiguousRangeResolver::pattern(&range),
                ambiguous_type.shape()
            );
        }
    }
}

// =============================================================================
// Accession selection
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_prioritizer_picks_best_key(candidates in prop::collection::vec(candidate(), 1..8)) {
        let results: Vec<_> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| translation(i, *c))
            .collect();
        let best = results.iter().map(selection_key).min().unwrap();

        let chosen = AccessionPrioritizer::select(results.clone()).unwrap();
        prop_assert_eq!(selection_key(&chosen), best.clone());

        // the winning key does not depend on input order
        let mut reversed = results;
        reversed.reverse();
        let chosen_reversed = AccessionPrioritizer::select(reversed).unwrap();
        prop_assert_eq!(selection_key(&chosen_reversed), best);
    }

    #[test]
    fn prop_prioritizer_is_deterministic(candidates in prop::collection::vec(candidate(), 1..8)) {
        let results: Vec<_> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| translation(i, *c))
            .collect();
        let first = AccessionPrioritizer::select(results.clone()).unwrap();
        let second = AccessionPrioritizer::select(results).unwrap();
        prop_assert_eq!(first.vrs_seq_loc_ac, second.vrs_seq_loc_ac);
    }
}

#[test]
fn test_prioritizer_empty_input() {
    assert!(AccessionPrioritizer::select(Vec::new()).is_none());
}

// =============================================================================
// Normalization
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_justify_is_idempotent((seq, start, end, alt) in edit()) {
        let first = justify(&seq, start, end, &alt).unwrap();
        let second = justify(&seq, first.start, first.end, &first.state).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_justify_preserves_the_edited_sequence((seq, start, end, alt) in edit()) {
        let justified = justify(&seq, start, end, &alt).unwrap();
        let apply = |s: usize, e: usize, a: &[u8]| {
            let mut out = seq[..s].to_vec();
            out.extend_from_slice(a);
            out.extend_from_slice(&seq[e..]);
            out
        };
        prop_assert_eq!(
            apply(start, end, &alt),
            apply(justified.start, justified.end, &justified.state)
        );
    }
}

// =============================================================================
// Copy number arithmetic
// =============================================================================

proptest! {
    #[test]
    fn prop_copy_number_count_arithmetic(
        baseline in 1..1_000u64,
        start in 0..10_000u64,
        len in 1..500u64,
    ) {
        let location = || SequenceLocation::new("SQ.test", start, start + len);
        let copies = |alt_type| match copy_number_count(alt_type, location(), baseline).unwrap() {
            Variation::CopyNumberCount(cn) => cn.copies,
            other => panic!("unexpected {:?}", other),
        };
        prop_assert_eq!(copies(AltType::Duplication), Coordinate::Number(baseline + 1));
        prop_assert_eq!(copies(AltType::Deletion), Coordinate::Number(baseline - 1));
    }

    #[test]
    fn prop_copy_number_count_rejects_other_edits(baseline in 1..1_000u64) {
        let location = SequenceLocation::new("SQ.test", 10, 20);
        prop_assert!(copy_number_count(AltType::Substitution, location, baseline).is_err());
    }
}
