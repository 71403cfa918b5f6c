//! End-to-end query tests: tokenize, classify, validate, translate
//!
//! Every case runs through [`QueryHandler`] against the shared mock fixture.

mod common;

use std::sync::Arc;

use ferro_vrs::vrs::Coordinate;
use ferro_vrs::{ClassificationType, CopyChange, DupDelMode, QueryContext, QueryHandler, Variation};
use rstest::rstest;

use common::handler;

// ==================== to_vrs ====================

#[rstest]
#[case("BRAF V600E", (599, 600), "V")]
#[case("BRAF p.V600E", (599, 600), "V")]
#[case("BRAF p.Val600Glu", (599, 600), "V")]
#[case("NP_004324.2:p.Val600Glu", (599, 600), "V")]
#[case("NC_000007.13:g.3G>C", (2, 3), "G")]
#[case("NM_004333.6:c.4A>T", (5, 6), "A")]
#[tokio::test]
async fn test_to_vrs_single_allele(
    #[case] query: &str,
    #[case] interval: (u64, u64),
    #[case] reference: &str,
) {
    let response = handler().to_vrs(query).await;
    assert!(response.warnings.is_empty(), "{}: {:?}", query, response.warnings);
    assert_eq!(response.search_term, query);
    assert_eq!(response.variations.len(), 1, "{}", query);

    let variation = &response.variations[0];
    assert_eq!(variation.type_name(), "Allele");
    assert!(variation.id().is_some_and(|id| id.starts_with("ga4gh:VA.")));
    let location = variation.location();
    assert_eq!(location.interval(), Some(interval));
    assert_eq!(location.sequence.as_deref(), Some(reference));
}

#[tokio::test]
async fn test_to_vrs_gnomad_keeps_matching_assembly() {
    // residue 3 is G on GRCh37 and A on GRCh38
    let response = handler().to_vrs("7-3-G-C").await;
    assert!(response.warnings.is_empty(), "{:?}", response.warnings);
    assert_eq!(response.variations.len(), 1);
    assert_eq!(response.variations[0].location().interval(), Some((2, 3)));
}

#[rstest]
#[case("NOTAGENE V600E", "Unable to tokenize: NOTAGENE")]
#[case("V600E", "Unable to find classification for: V600E")]
#[tokio::test]
async fn test_to_vrs_failures_are_warnings(#[case] query: &str, #[case] warning: &str) {
    let response = handler().to_vrs(query).await;
    assert!(response.variations.is_empty());
    assert_eq!(response.warnings, vec![warning.to_string()]);
}

#[rstest]
#[case("7-18446744073709551615-A-AT")]
#[case("7-18446744073709551615-AC-A")]
#[case("NC_000007.14:g.18446744073709551615A>T")]
#[case("NC_000007.14:g.18446744073709551614_18446744073709551615del")]
#[tokio::test]
async fn test_positions_at_u64_max_are_warnings(#[case] query: &str) {
    let handler = handler();
    let response = handler.to_vrs(query).await;
    assert!(response.variations.is_empty(), "{}", query);
    assert!(!response.warnings.is_empty(), "{}", query);

    let response = handler
        .normalize(query, DupDelMode::Default, None, None)
        .await;
    assert!(response.variation.is_none(), "{}", query);
    assert!(!response.warnings.is_empty(), "{}", query);
}

#[tokio::test]
async fn test_to_vrs_reference_mismatch_is_warning() {
    // residue 3 on GRCh37 is G
    let response = handler().to_vrs("NC_000007.13:g.3A>C").await;
    assert!(response.variations.is_empty());
    assert!(!response.warnings.is_empty());
}

#[tokio::test]
async fn test_identifiers_are_deterministic() {
    let handler = handler();
    let first = handler.to_vrs("BRAF V600E").await;
    let second = handler.to_vrs("BRAF V600E").await;
    assert_eq!(first.variations[0].id(), second.variations[0].id());

    let protein = handler.to_vrs("NP_004324.2:p.Val600Glu").await;
    assert_eq!(first.variations[0].id(), protein.variations[0].id());
}

// ==================== normalize ====================

#[tokio::test]
async fn test_normalize_lifts_grch37_to_grch38() {
    let handler = handler();
    let lifted = handler
        .normalize("NC_000007.13:g.3G>C", DupDelMode::Default, None, None)
        .await;
    assert!(lifted.warnings.is_empty(), "{:?}", lifted.warnings);
    let lifted = lifted.variation.unwrap();
    assert_eq!(lifted.location().interval(), Some((6, 7)));

    let native = handler
        .normalize("NC_000007.14:g.7G>C", DupDelMode::Default, None, None)
        .await
        .variation
        .unwrap();
    assert_eq!(lifted.id(), native.id());
}

#[tokio::test]
async fn test_normalize_with_mane_has_no_warning() {
    let ctx = QueryContext::from_provider(Arc::new(common::provider_with_mane()));
    let handler = QueryHandler::new(ctx).unwrap();
    let response = handler
        .normalize("BRAF V600E", DupDelMode::Default, None, None)
        .await;
    assert!(response.warnings.is_empty(), "{:?}", response.warnings);
    assert_eq!(
        response.variation.unwrap().location().interval(),
        Some((599, 600))
    );
}

#[tokio::test]
async fn test_normalize_without_mane_warns() {
    let response = handler()
        .normalize("BRAF V600E", DupDelMode::Default, None, None)
        .await;
    assert!(response.variation.is_some());
    assert_eq!(response.warnings, vec!["Unable to find MANE representation"]);
}

#[rstest]
#[case(DupDelMode::Allele, "Allele")]
#[case(DupDelMode::CopyNumberChange, "CopyNumberChange")]
#[tokio::test]
async fn test_normalize_dup_del_modes(#[case] mode: DupDelMode, #[case] type_name: &str) {
    let response = handler()
        .normalize("NC_000007.14:g.7_9dup", mode, None, None)
        .await;
    assert!(response.warnings.is_empty(), "{:?}", response.warnings);
    assert_eq!(response.variation.unwrap().type_name(), type_name);
}

#[rstest]
#[case("NC_000007.14:g.7_9dup", None)]
#[case("NC_000007.14:g.7_9dup", Some(0))]
#[case("NC_000007.14:g.7_9del", Some(0))]
#[tokio::test]
async fn test_normalize_default_mode_without_baseline_builds_allele(
    #[case] expr: &str,
    #[case] baseline: Option<u64>,
) {
    let response = handler()
        .normalize(expr, DupDelMode::Default, baseline, None)
        .await;
    assert!(response.warnings.is_empty(), "{:?}", response.warnings);
    assert_eq!(response.variation.unwrap().type_name(), "Allele");
}

#[tokio::test]
async fn test_normalize_copy_number_count_with_baseline() {
    let response = handler()
        .normalize(
            "NC_000007.14:g.7_9dup",
            DupDelMode::CopyNumberCount,
            Some(2),
            None,
        )
        .await;
    match response.variation {
        Some(Variation::CopyNumberCount(cn)) => assert_eq!(cn.copies, Coordinate::Number(3)),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_normalize_copy_number_count_requires_baseline() {
    for baseline in [None, Some(0)] {
        let response = handler()
            .normalize(
                "NC_000007.14:g.7_9dup",
                DupDelMode::CopyNumberCount,
                baseline,
                None,
            )
            .await;
        assert!(response.variation.is_none());
        assert_eq!(
            response.warnings,
            vec!["copy_number_count mode requires `baseline_copies`"]
        );
    }
}

// ==================== copy number endpoints ====================

#[rstest]
#[case("NC_000007.14:g.7_9dup", 2, 3)]
#[case("NC_000007.14:g.7_9del", 2, 1)]
#[case("NC_000007.14:g.7_9del", 1, 0)]
#[tokio::test]
async fn test_hgvs_to_copy_number_count(
    #[case] expr: &str,
    #[case] baseline: u64,
    #[case] copies: u64,
) {
    let response = handler()
        .hgvs_to_copy_number_count(expr, baseline, false)
        .await;
    assert!(response.warnings.is_empty(), "{:?}", response.warnings);
    let cn = response.copy_number_count.unwrap();
    assert_eq!(cn.copies, Coordinate::Number(copies));
    assert_eq!(cn.location.interval(), Some((6, 9)));
    assert!(cn.id.unwrap().starts_with("ga4gh:CN."));
}

#[tokio::test]
async fn test_hgvs_to_copy_number_count_lifts_over() {
    let response = handler()
        .hgvs_to_copy_number_count("NC_000007.13:g.7_9dup", 2, true)
        .await;
    assert!(response.warnings.is_empty(), "{:?}", response.warnings);
    let cn = response.copy_number_count.unwrap();
    assert_eq!(cn.location.interval(), Some((10, 13)));
}

#[tokio::test]
async fn test_hgvs_to_copy_number_change_ambiguous_deletion() {
    let response = handler()
        .hgvs_to_copy_number_change("NC_000007.14:g.(?_4)_(10_?)del", None, false)
        .await;
    assert!(response.warnings.is_empty(), "{:?}", response.warnings);
    let cx = response.copy_number_change.unwrap();
    assert_eq!(cx.copy_change, CopyChange::Loss);
    assert_eq!(cx.location.start, Coordinate::Range([None, Some(3)]));
    assert_eq!(cx.location.end, Coordinate::Range([Some(10), None]));
    assert!(cx.location.sequence.is_none());
}

#[tokio::test]
async fn test_hgvs_to_copy_number_change_explicit_change() {
    let response = handler()
        .hgvs_to_copy_number_change(
            "NC_000007.14:g.7_9dup",
            Some(CopyChange::HighLevelGain),
            false,
        )
        .await;
    let cx = response.copy_number_change.unwrap();
    assert_eq!(cx.copy_change, CopyChange::HighLevelGain);
    assert!(cx.id.unwrap().starts_with("ga4gh:CX."));
}

#[tokio::test]
async fn test_copy_number_endpoints_reject_non_genomic() {
    let response = handler()
        .hgvs_to_copy_number_count("NM_004333.6:c.4A>T", 2, false)
        .await;
    assert!(response.copy_number_count.is_none());
    assert_eq!(
        response.warnings,
        vec!["NM_004333.6:c.4A>T is not a supported HGVS genomic duplication or deletion"]
    );
}

// ==================== classification ====================

#[rstest]
#[case("BRAF V600E", ClassificationType::ProteinSubstitution)]
#[case("NC_000007.13:g.3G>C", ClassificationType::GenomicSubstitution)]
#[case("NC_000007.14:g.7_9dup", ClassificationType::GenomicDuplication)]
#[case("7-3-G-C", ClassificationType::GenomicSubstitution)]
#[tokio::test]
async fn test_classify(#[case] query: &str, #[case] expected: ClassificationType) {
    let (classification, warnings) = handler().classify(query).await;
    assert!(warnings.is_empty(), "{:?}", warnings);
    assert_eq!(classification.unwrap().classification_type(), expected);
}

#[tokio::test]
async fn test_normalize_cdna_without_mane_stays_on_transcript() {
    // the fixture declares no MANE data, so cDNA stays on its own accession
    let response = handler()
        .normalize("NM_004333.6:c.4A>T", DupDelMode::Default, None, None)
        .await;
    assert_eq!(response.warnings, vec!["Unable to find MANE representation"]);
    assert_eq!(
        response.variation.unwrap().location().interval(),
        Some((5, 6))
    );
}
