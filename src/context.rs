//! Query context
//!
//! Holds the collaborators a query needs and enforces a deadline on every
//! call. Built once and shared by reference; it carries no per-query state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{NormalizerConfig, TimeoutConfig};
use crate::error::FerroError;
use crate::liftover::ChainLiftover;
use crate::reference::{
    AccessionKind, AlleleNormalizer, AnnotationLayer, Assembly, GeneMatch, GeneNormalizer,
    LiftoverService, PrioritizedLocation, PriorityResolver, ResidueMode, SequenceAccess,
    TranscriptAlignment, TranscriptDatabase,
};
use crate::reference::MockProvider;
use crate::vrs::{Allele, FullyJustifiedNormalizer};

/// Collaborators plus per-call deadlines
#[derive(Clone)]
pub struct QueryContext {
    sequences: Arc<dyn SequenceAccess>,
    transcripts: Arc<dyn TranscriptDatabase>,
    genes: Arc<dyn GeneNormalizer>,
    liftover: Arc<dyn LiftoverService>,
    normalizer: Arc<dyn AlleleNormalizer>,
    priority: Arc<dyn PriorityResolver>,
    timeouts: TimeoutConfig,
}

impl QueryContext {
    pub fn new(
        sequences: Arc<dyn SequenceAccess>,
        transcripts: Arc<dyn TranscriptDatabase>,
        genes: Arc<dyn GeneNormalizer>,
        liftover: Arc<dyn LiftoverService>,
        normalizer: Arc<dyn AlleleNormalizer>,
        priority: Arc<dyn PriorityResolver>,
    ) -> Self {
        Self {
            sequences,
            transcripts,
            genes,
            liftover,
            normalizer,
            priority,
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Use one provider for every collaborator
    pub fn from_provider<P>(provider: Arc<P>) -> Self
    where
        P: SequenceAccess
            + TranscriptDatabase
            + GeneNormalizer
            + LiftoverService
            + AlleleNormalizer
            + PriorityResolver
            + 'static,
    {
        Self::new(
            provider.clone(),
            provider.clone(),
            provider.clone(),
            provider.clone(),
            provider.clone(),
            provider,
        )
    }

    /// Build from configuration.
    ///
    /// Sequences, transcripts and genes come from the configured JSON
    /// fixture (empty when none is set). Chain files, when given, replace the
    /// fixture's liftover, and alleles are normalized by the fully-justified
    /// normalizer over the fixture's sequences.
    pub fn from_config(config: &NormalizerConfig) -> Result<Self, FerroError> {
        let provider = match &config.data.reference_json {
            Some(path) => MockProvider::from_json(path)?,
            None => MockProvider::new(),
        };
        let provider = Arc::new(provider);
        let normalizer = FullyJustifiedNormalizer::new(provider.clone())
            .with_window(config.normalize.window, config.normalize.max_window);

        let mut ctx = Self::from_provider(provider)
            .with_timeouts(config.timeouts.clone())
            .with_normalizer(Arc::new(normalizer));
        if config.data.grch37_to_38.is_some() || config.data.grch38_to_37.is_some() {
            let liftover = ChainLiftover::from_paths(
                config.data.grch37_to_38.as_deref(),
                config.data.grch38_to_37.as_deref(),
            )?;
            ctx = ctx.with_liftover(Arc::new(liftover));
        }
        Ok(ctx)
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_liftover(mut self, liftover: Arc<dyn LiftoverService>) -> Self {
        self.liftover = liftover;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn AlleleNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn sequences(&self) -> Arc<dyn SequenceAccess> {
        self.sequences.clone()
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        deadline: Duration,
        call: F,
    ) -> Result<T, FerroError>
    where
        F: Future<Output = Result<T, FerroError>>,
    {
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                let millis = deadline.as_millis() as u64;
                tracing::warn!(operation, millis, "collaborator call timed out");
                Err(FerroError::Timeout {
                    operation: operation.to_string(),
                    millis,
                })
            }
        }
    }

    pub async fn get_reference_sequence(
        &self,
        accession: &str,
        start: Option<u64>,
        end: Option<u64>,
        residue_mode: ResidueMode,
    ) -> Result<String, FerroError> {
        self.bounded(
            "get_reference_sequence",
            self.timeouts.sequence(),
            self.sequences
                .get_reference_sequence(accession, start, end, residue_mode),
        )
        .await
    }

    pub async fn sequence_length(&self, accession: &str) -> Result<u64, FerroError> {
        self.bounded(
            "sequence_length",
            self.timeouts.sequence(),
            self.sequences.sequence_length(accession),
        )
        .await
    }

    pub async fn translate_identifier(
        &self,
        identifier: &str,
        target_namespace: Option<&str>,
    ) -> Result<Vec<String>, FerroError> {
        self.bounded(
            "translate_identifier",
            self.timeouts.sequence(),
            self.sequences
                .translate_identifier(identifier, target_namespace),
        )
        .await
    }

    /// First `ga4gh:SQ.` identifier of an accession
    pub async fn refget_accession(&self, accession: &str) -> Result<String, FerroError> {
        self.translate_identifier(accession, Some("ga4gh"))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FerroError::ReferenceNotFound {
                id: accession.to_string(),
            })
    }

    pub async fn get_cds_start_end(&self, accession: &str) -> Result<Option<(u64, u64)>, FerroError> {
        self.bounded(
            "get_cds_start_end",
            self.timeouts.transcript(),
            self.transcripts.get_cds_start_end(accession),
        )
        .await
    }

    pub async fn get_accessions_for_gene(
        &self,
        symbol: &str,
        kind: AccessionKind,
    ) -> Result<Vec<String>, FerroError> {
        self.bounded(
            "get_accessions_for_gene",
            self.timeouts.transcript(),
            self.transcripts.get_accessions_for_gene(symbol, kind),
        )
        .await
    }

    pub async fn get_transcript_for_protein(
        &self,
        protein_accession: &str,
    ) -> Result<Option<String>, FerroError> {
        self.bounded(
            "get_transcript_for_protein",
            self.timeouts.transcript(),
            self.transcripts.get_transcript_for_protein(protein_accession),
        )
        .await
    }

    pub async fn get_alignment(
        &self,
        tx_accession: &str,
        assembly: Assembly,
    ) -> Result<Option<TranscriptAlignment>, FerroError> {
        self.bounded(
            "get_alignment",
            self.timeouts.transcript(),
            self.transcripts.get_alignment(tx_accession, assembly),
        )
        .await
    }

    pub async fn get_chromosome_assembly(
        &self,
        accession: &str,
    ) -> Result<Option<(String, Assembly)>, FerroError> {
        self.bounded(
            "get_chromosome_assembly",
            self.timeouts.transcript(),
            self.transcripts.get_chromosome_assembly(accession),
        )
        .await
    }

    pub async fn normalize_gene(&self, term: &str) -> Result<GeneMatch, FerroError> {
        self.bounded(
            "normalize_gene",
            self.timeouts.gene(),
            self.genes.normalize(term),
        )
        .await
    }

    pub async fn get_liftover(
        &self,
        chromosome: &str,
        pos: u64,
        target: Assembly,
    ) -> Result<Option<(String, u64)>, FerroError> {
        self.bounded(
            "get_liftover",
            self.timeouts.liftover(),
            self.liftover.get_liftover(chromosome, pos, target),
        )
        .await
    }

    pub async fn normalize_allele(&self, allele: Allele, accession: &str) -> Result<Allele, FerroError> {
        self.bounded(
            "normalize_allele",
            self.timeouts.normalizer(),
            self.normalizer.normalize(allele, accession),
        )
        .await
    }

    pub async fn get_prioritized(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        layer: AnnotationLayer,
        gene: Option<&str>,
    ) -> Result<Option<PrioritizedLocation>, FerroError> {
        self.bounded(
            "get_prioritized",
            self.timeouts.mane(),
            self.priority
                .get_prioritized(accession, start, end, layer, gene),
        )
        .await
    }
}
