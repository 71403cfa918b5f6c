//! Collaborator traits
//!
//! The pipeline never touches sequence stores, transcript databases or gene
//! catalogs directly. It calls these narrow async interfaces, held as
//! `Arc<dyn Trait>` inside [`QueryContext`](crate::context::QueryContext).
//!
//! Implementations might include:
//! - [`MockProvider`](super::MockProvider) for testing and JSON fixtures
//! - a SeqRepo/UTA-backed provider
//! - [`ChainLiftover`](crate::liftover::ChainLiftover) for liftover

use async_trait::async_trait;

use crate::error::FerroError;
use crate::reference::transcript::{
    AccessionKind, AnnotationLayer, Assembly, GeneMatch, PrioritizedLocation, ResidueMode,
    TranscriptAlignment,
};
use crate::vrs::Allele;

/// Sequence retrieval and identifier translation
#[async_trait]
pub trait SequenceAccess: Send + Sync {
    /// Get a sequence region
    ///
    /// # Arguments
    ///
    /// * `accession` - Any identifier the implementation can resolve
    /// * `start` - Start position; `None` means the beginning of the sequence
    /// * `end` - End position; `None` means a single residue in
    ///   [`ResidueMode::Residue`], or the end of the sequence when `start`
    ///   is also `None`
    /// * `residue_mode` - Coordinate convention of `start`/`end`
    async fn get_reference_sequence(
        &self,
        accession: &str,
        start: Option<u64>,
        end: Option<u64>,
        residue_mode: ResidueMode,
    ) -> Result<String, FerroError>;

    /// Total length of a sequence
    async fn sequence_length(&self, accession: &str) -> Result<u64, FerroError>;

    /// Translate an identifier into aliases, optionally restricted to one
    /// namespace (`ga4gh`, `refseq`, `GRCh38`, ...)
    async fn translate_identifier(
        &self,
        identifier: &str,
        target_namespace: Option<&str>,
    ) -> Result<Vec<String>, FerroError>;
}

/// Transcript and accession metadata
#[async_trait]
pub trait TranscriptDatabase: Send + Sync {
    /// 0-based half-open CDS bounds of a transcript, `None` for non-coding
    async fn get_cds_start_end(&self, accession: &str) -> Result<Option<(u64, u64)>, FerroError>;

    /// Accessions of the requested kind associated with a gene symbol
    async fn get_accessions_for_gene(
        &self,
        symbol: &str,
        kind: AccessionKind,
    ) -> Result<Vec<String>, FerroError>;

    /// Transcript encoding a protein accession
    async fn get_transcript_for_protein(
        &self,
        protein_accession: &str,
    ) -> Result<Option<String>, FerroError>;

    /// Exon alignment of a transcript onto an assembly
    async fn get_alignment(
        &self,
        tx_accession: &str,
        assembly: Assembly,
    ) -> Result<Option<TranscriptAlignment>, FerroError>;

    /// Chromosome name and assembly of a genomic accession
    async fn get_chromosome_assembly(
        &self,
        accession: &str,
    ) -> Result<Option<(String, Assembly)>, FerroError>;
}

/// Gene term normalization
#[async_trait]
pub trait GeneNormalizer: Send + Sync {
    async fn normalize(&self, term: &str) -> Result<GeneMatch, FerroError>;
}

/// Position liftover between assemblies
#[async_trait]
pub trait LiftoverService: Send + Sync {
    /// Lift a 1-based chromosome position to `target`; `None` if unmappable
    async fn get_liftover(
        &self,
        chromosome: &str,
        pos: u64,
        target: Assembly,
    ) -> Result<Option<(String, u64)>, FerroError>;
}

/// Allele normalization
#[async_trait]
pub trait AlleleNormalizer: Send + Sync {
    /// Normalize an allele located on `accession`
    async fn normalize(&self, allele: Allele, accession: &str) -> Result<Allele, FerroError>;
}

/// Representative-transcript selection
#[async_trait]
pub trait PriorityResolver: Send + Sync {
    /// Best location for an inter-residue interval, or `None` if the
    /// accession has no prioritized representation
    async fn get_prioritized(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        layer: AnnotationLayer,
        gene: Option<&str>,
    ) -> Result<Option<PrioritizedLocation>, FerroError>;
}
