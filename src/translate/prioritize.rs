//! Choosing one translation among several accessions

use std::cmp::Reverse;

use super::TranslationResult;

/// Accession split into its unversioned name and version, `0` when the
/// version is absent
fn accession_key(accession: Option<&str>) -> (String, u32) {
    let accession = accession.unwrap_or_default();
    match accession.rsplit_once('.') {
        Some((name, version)) => (name.to_string(), version.parse().unwrap_or(0)),
        None => (accession.to_string(), 0),
    }
}

/// Picks the best-status translation
pub struct AccessionPrioritizer;

impl AccessionPrioritizer {
    /// Best status wins. Among equal statuses a result that kept its original
    /// accession wins, then the original accession that sorts last by
    /// unversioned name and version, then input order.
    pub fn select(results: Vec<TranslationResult>) -> Option<TranslationResult> {
        results
            .into_iter()
            .enumerate()
            .min_by_key(|(index, r)| {
                let kept_accession = r.og_ac.is_some() && r.og_ac == r.vrs_seq_loc_ac;
                let (name, version) = accession_key(r.og_ac.as_deref());
                (
                    r.vrs_seq_loc_ac_status,
                    !kept_accession,
                    Reverse(name),
                    Reverse(version),
                    *index,
                )
            })
            .map(|(_, r)| r)
    }
}
