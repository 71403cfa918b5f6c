//! Reference data abstraction
//!
//! Collaborator traits the pipeline calls for sequences, transcripts, genes,
//! liftover and normalization, plus an in-memory implementation.

pub mod mock;
pub mod provider;
pub mod transcript;

pub use mock::{MockProvider, TranscriptEntry};
pub use provider::{
    AlleleNormalizer, GeneNormalizer, LiftoverService, PriorityResolver, SequenceAccess,
    TranscriptDatabase,
};
pub use transcript::{
    AccessionKind, AnnotationLayer, Assembly, ExonAlignment, Gene, GeneLocation, GeneMatch,
    MatchType, PrioritizedLocation, ResidueMode, Strand, TranscriptAlignment, TranscriptPriority,
};

/// Is this a protein accession (RefSeq or Ensembl)?
pub fn is_protein_accession(accession: &str) -> bool {
    ["NP_", "XP_", "YP_", "ENSP"]
        .iter()
        .any(|prefix| accession.starts_with(prefix))
}

/// Is this a genomic assembly accession (`NC_`, `NT_`, `NW_`)?
pub fn is_genomic_accession(accession: &str) -> bool {
    ["NC_", "NT_", "NW_"]
        .iter()
        .any(|prefix| accession.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accession_families() {
        assert!(is_protein_accession("NP_004324.2"));
        assert!(is_protein_accession("ENSP00000288602.6"));
        assert!(!is_protein_accession("NM_004333.6"));
        assert!(is_genomic_accession("NC_000007.14"));
        assert!(!is_genomic_accession("NM_004333.6"));
    }
}
