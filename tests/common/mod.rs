//! Shared reference fixture for integration tests
//!
//! Chromosome 7 on both assemblies, with GRCh37 residues 1..=15 lifting to
//! GRCh38 residues 5..=19. BRAF has a protein, a transcript aligned to
//! GRCh38 and a gene location; EGFR is known but unplaced.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use ferro_vrs::reference::mock::LiftoverBlock;
use ferro_vrs::reference::{
    Assembly, ExonAlignment, Gene, GeneLocation, MockProvider, Strand, TranscriptAlignment,
    TranscriptEntry, TranscriptPriority,
};
use ferro_vrs::{QueryContext, QueryHandler};

pub const GENOMIC_37: &str = "TTGCAGCAGCATTACGGACT";

pub fn genomic_38() -> String {
    format!("AAAA{}", GENOMIC_37)
}

pub fn protein() -> String {
    format!("{}V{}", "A".repeat(599), "K".repeat(10))
}

pub fn provider() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.add_sequence("NP_004324.2", protein());
    provider.add_sequence("NM_004333.6", "CCATGACGTAA");

    let mut alignments = HashMap::new();
    alignments.insert(
        Assembly::GRCh38,
        TranscriptAlignment {
            tx_ac: "NM_004333.6".to_string(),
            alt_ac: "NC_000007.14".to_string(),
            strand: Strand::Plus,
            exons: vec![ExonAlignment {
                tx_start: 0,
                tx_end: 11,
                alt_start: 4,
                alt_end: 15,
            }],
        },
    );
    provider.add_transcript(TranscriptEntry {
        accession: "NM_004333.6".to_string(),
        gene: Some("BRAF".to_string()),
        cds_start: Some(2),
        cds_end: Some(11),
        protein_accession: Some("NP_004324.2".to_string()),
        alignments,
    });

    provider.add_sequence("NC_000007.13", GENOMIC_37);
    provider.add_chromosome("NC_000007.13", "chr7", Assembly::GRCh37);
    provider.add_sequence("NC_000007.14", genomic_38());
    provider.add_chromosome("NC_000007.14", "chr7", Assembly::GRCh38);
    provider.add_liftover_block(LiftoverBlock {
        chromosome: "chr7".to_string(),
        start: 1,
        end: 15,
        target: Assembly::GRCh38,
        to_chromosome: "chr7".to_string(),
        to_start: 5,
    });

    provider.add_gene(Gene {
        symbol: "BRAF".to_string(),
        location: Some(GeneLocation {
            accession: "NC_000007.14".to_string(),
            start: 4,
            end: 24,
        }),
    });
    provider.add_gene(Gene {
        symbol: "EGFR".to_string(),
        location: None,
    });
    provider
}

/// Fixture with BRAF p. declared MANE Select
pub fn provider_with_mane() -> MockProvider {
    let mut provider = provider();
    provider.add_mane(
        "NP_004324.2",
        "NP_004324.2",
        TranscriptPriority::ManeSelect,
        0,
        None,
    );
    provider
}

pub fn context() -> QueryContext {
    QueryContext::from_provider(Arc::new(provider()))
}

pub fn handler() -> QueryHandler {
    QueryHandler::new(context()).expect("grammar is valid")
}
