//! Mock reference provider for testing
//!
//! An in-memory implementation of every collaborator trait. Build it
//! programmatically or load a JSON fixture with [`MockProvider::from_json`].

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FerroError;
use crate::reference::provider::{
    AlleleNormalizer, GeneNormalizer, LiftoverService, PriorityResolver, SequenceAccess,
    TranscriptDatabase,
};
use crate::reference::transcript::{
    AccessionKind, AnnotationLayer, Assembly, Gene, GeneMatch, MatchType, PrioritizedLocation,
    ResidueMode, TranscriptAlignment, TranscriptPriority,
};
use crate::reference::{is_genomic_accession, is_protein_accession};
use crate::vrs::digest::sha512t24u;
use crate::vrs::normalize::justify;
use crate::vrs::{Allele, SequenceLocation};

/// Sequence with its identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub accession: String,
    pub sequence: String,
    /// Extra namespaced aliases such as `GRCh38:chr7`
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Transcript metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub accession: String,
    pub gene: Option<String>,
    /// 0-based half-open CDS bounds
    pub cds_start: Option<u64>,
    pub cds_end: Option<u64>,
    pub protein_accession: Option<String>,
    #[serde(default)]
    pub alignments: HashMap<Assembly, TranscriptAlignment>,
}

/// Gene record with the terms it answers to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneEntry {
    #[serde(flatten)]
    pub gene: Gene,
    pub concept_id: Option<String>,
    #[serde(default)]
    pub previous_symbols: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Genomic accession placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromosomeEntry {
    pub accession: String,
    pub chromosome: String,
    pub assembly: Assembly,
}

/// Contiguous liftover block: `[start, end]` on `chromosome` maps onto
/// `to_start..` on `to_chromosome` in `target`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiftoverBlock {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub target: Assembly,
    pub to_chromosome: String,
    pub to_start: u64,
}

/// Prioritized representation of a source accession
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManeEntry {
    pub source: String,
    pub accession: String,
    pub status: TranscriptPriority,
    /// Added to source positions to get target positions
    #[serde(default)]
    pub offset: i64,
    pub cds_start: Option<u64>,
}

/// JSON fixture layout accepted by [`MockProvider::from_json`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockFixture {
    #[serde(default)]
    pub sequences: Vec<SequenceEntry>,
    #[serde(default)]
    pub transcripts: Vec<TranscriptEntry>,
    #[serde(default)]
    pub genes: Vec<GeneEntry>,
    #[serde(default)]
    pub chromosomes: Vec<ChromosomeEntry>,
    #[serde(default)]
    pub liftover: Vec<LiftoverBlock>,
    #[serde(default)]
    pub mane: Vec<ManeEntry>,
}

/// In-memory collaborator implementation
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    sequences: HashMap<String, String>,
    /// Every known identifier (bare or namespaced) to its canonical accession
    identifiers: HashMap<String, String>,
    /// Canonical accession to its namespaced aliases
    aliases: HashMap<String, Vec<String>>,
    transcripts: HashMap<String, TranscriptEntry>,
    /// Lower-cased term to gene and match strength
    gene_terms: HashMap<String, (MatchType, Gene)>,
    chromosomes: HashMap<String, (String, Assembly)>,
    liftover: Vec<LiftoverBlock>,
    mane: HashMap<String, ManeEntry>,
}

fn namespace_for(accession: &str) -> &'static str {
    if accession.starts_with("ENS") {
        "ensembl"
    } else {
        "refseq"
    }
}

impl MockProvider {
    /// Create an empty mock provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture from a JSON file
    pub fn from_json(path: &Path) -> Result<Self, FerroError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, FerroError> {
        let fixture: MockFixture = serde_json::from_str(content)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_fixture(fixture: MockFixture) -> Self {
        let mut provider = Self::new();
        for entry in fixture.sequences {
            provider.add_sequence(&entry.accession, entry.sequence);
            for alias in entry.aliases {
                provider.add_alias(&entry.accession, alias);
            }
        }
        for transcript in fixture.transcripts {
            provider.add_transcript(transcript);
        }
        for gene in fixture.genes {
            provider.add_gene_entry(gene);
        }
        for c in fixture.chromosomes {
            provider.add_chromosome(&c.accession, &c.chromosome, c.assembly);
        }
        for block in fixture.liftover {
            provider.add_liftover_block(block);
        }
        for entry in fixture.mane {
            provider.mane.insert(entry.source.clone(), entry);
        }
        provider
    }

    /// Add a sequence; it becomes reachable by accession, `refseq:`/`ensembl:`
    /// alias and its `ga4gh:SQ.` identifier
    pub fn add_sequence(&mut self, accession: &str, sequence: impl Into<String>) {
        let sequence = sequence.into().to_ascii_uppercase();
        let refget = format!("ga4gh:SQ.{}", sha512t24u(&sequence));
        let namespaced = format!("{}:{}", namespace_for(accession), accession);

        self.sequences.insert(accession.to_string(), sequence);
        self.identifiers
            .insert(accession.to_string(), accession.to_string());
        self.add_alias(accession, namespaced);
        self.identifiers.insert(
            refget.trim_start_matches("ga4gh:").to_string(),
            accession.to_string(),
        );
        self.add_alias(accession, refget);
    }

    /// Register a namespaced alias (`GRCh38:chr7`) for a known accession
    pub fn add_alias(&mut self, accession: &str, alias: impl Into<String>) {
        let alias = alias.into();
        self.identifiers.insert(alias.clone(), accession.to_string());
        let list = self.aliases.entry(accession.to_string()).or_default();
        if !list.contains(&alias) {
            list.push(alias);
        }
    }

    pub fn add_transcript(&mut self, transcript: TranscriptEntry) {
        self.transcripts
            .insert(transcript.accession.clone(), transcript);
    }

    /// Add a gene answering to its symbol
    pub fn add_gene(&mut self, gene: Gene) {
        self.add_gene_entry(GeneEntry {
            gene,
            concept_id: None,
            previous_symbols: Vec::new(),
            aliases: Vec::new(),
        });
    }

    pub fn add_gene_entry(&mut self, entry: GeneEntry) {
        let gene = entry.gene;
        let mut terms = vec![(gene.symbol.clone(), MatchType::Symbol)];
        terms.extend(entry.concept_id.map(|id| (id, MatchType::ConceptId)));
        terms.extend(
            entry
                .previous_symbols
                .into_iter()
                .map(|s| (s, MatchType::PrevSymbol)),
        );
        terms.extend(entry.aliases.into_iter().map(|s| (s, MatchType::Alias)));

        for (term, match_type) in terms {
            let key = term.to_lowercase();
            // A stronger match for the same term wins.
            let keep_existing = self
                .gene_terms
                .get(&key)
                .is_some_and(|(existing, _)| *existing > match_type);
            if !keep_existing {
                self.gene_terms.insert(key, (match_type, gene.clone()));
            }
        }
    }

    /// Place a genomic accession on a chromosome; registers `{assembly}:{chrom}`
    /// aliases with and without the `chr` prefix
    pub fn add_chromosome(&mut self, accession: &str, chromosome: &str, assembly: Assembly) {
        let bare = chromosome.trim_start_matches("chr");
        self.add_alias(accession, format!("{}:chr{}", assembly, bare));
        self.add_alias(accession, format!("{}:{}", assembly, bare));
        self.chromosomes.insert(
            accession.to_string(),
            (format!("chr{}", bare), assembly),
        );
    }

    /// Map one position
    pub fn add_liftover(
        &mut self,
        chromosome: &str,
        pos: u64,
        target: Assembly,
        to: (&str, u64),
    ) {
        self.add_liftover_block(LiftoverBlock {
            chromosome: chromosome.to_string(),
            start: pos,
            end: pos,
            target,
            to_chromosome: to.0.to_string(),
            to_start: to.1,
        });
    }

    pub fn add_liftover_block(&mut self, block: LiftoverBlock) {
        self.liftover.push(block);
    }

    /// Declare the prioritized representation of `source`
    pub fn add_mane(
        &mut self,
        source: &str,
        accession: &str,
        status: TranscriptPriority,
        offset: i64,
        cds_start: Option<u64>,
    ) {
        self.mane.insert(
            source.to_string(),
            ManeEntry {
                source: source.to_string(),
                accession: accession.to_string(),
                status,
                offset,
                cds_start,
            },
        );
    }

    fn resolve(&self, identifier: &str) -> Result<(&str, &str), FerroError> {
        let accession = self
            .identifiers
            .get(identifier)
            .or_else(|| self.identifiers.get(identifier.trim_start_matches("ga4gh:")))
            .ok_or_else(|| FerroError::ReferenceNotFound {
                id: identifier.to_string(),
            })?;
        let sequence = self
            .sequences
            .get(accession)
            .ok_or_else(|| FerroError::ReferenceNotFound {
                id: identifier.to_string(),
            })?;
        Ok((accession.as_str(), sequence.as_str()))
    }

    fn shift(pos: u64, offset: i64) -> u64 {
        pos.saturating_add_signed(offset)
    }
}

#[async_trait]
impl SequenceAccess for MockProvider {
    async fn get_reference_sequence(
        &self,
        accession: &str,
        start: Option<u64>,
        end: Option<u64>,
        residue_mode: ResidueMode,
    ) -> Result<String, FerroError> {
        let (_, sequence) = self.resolve(accession)?;
        let len = sequence.len() as u64;
        let (start0, end0) = match start {
            Some(start) => residue_mode.to_inter_residue(start, end),
            None => (0, end.unwrap_or(len)),
        };

        if start0 > end0 {
            return Err(FerroError::PositionOutOfBounds {
                msg: format!(
                    "Invalid inter-residue coordinates: start ({}) cannot be greater than end ({})",
                    start0, end0
                ),
            });
        }
        if start0 > len {
            return Err(FerroError::PositionOutOfBounds {
                msg: format!(
                    "Start inter-residue coordinate ({}) is out of index on {}",
                    start0, accession
                ),
            });
        }
        if end0 > len {
            return Err(FerroError::PositionOutOfBounds {
                msg: format!(
                    "End inter-residue coordinate ({}) is out of index on {}",
                    end0, accession
                ),
            });
        }
        Ok(sequence[start0 as usize..end0 as usize].to_string())
    }

    async fn sequence_length(&self, accession: &str) -> Result<u64, FerroError> {
        Ok(self.resolve(accession)?.1.len() as u64)
    }

    async fn translate_identifier(
        &self,
        identifier: &str,
        target_namespace: Option<&str>,
    ) -> Result<Vec<String>, FerroError> {
        let (accession, _) = self.resolve(identifier)?;
        let aliases = self.aliases.get(accession).cloned().unwrap_or_default();
        Ok(match target_namespace {
            Some(ns) => {
                let prefix = format!("{}:", ns);
                aliases
                    .into_iter()
                    .filter(|a| a.starts_with(&prefix))
                    .collect()
            }
            None => aliases,
        })
    }
}

#[async_trait]
impl TranscriptDatabase for MockProvider {
    async fn get_cds_start_end(&self, accession: &str) -> Result<Option<(u64, u64)>, FerroError> {
        Ok(self
            .transcripts
            .get(accession)
            .and_then(|tx| tx.cds_start.zip(tx.cds_end)))
    }

    async fn get_accessions_for_gene(
        &self,
        symbol: &str,
        kind: AccessionKind,
    ) -> Result<Vec<String>, FerroError> {
        let mut transcripts: Vec<&TranscriptEntry> = self
            .transcripts
            .values()
            .filter(|tx| tx.gene.as_deref() == Some(symbol))
            .collect();
        transcripts.sort_by(|a, b| a.accession.cmp(&b.accession));

        let mut accessions: Vec<String> = match kind {
            AccessionKind::Cdna => transcripts
                .iter()
                .filter(|tx| tx.cds_start.is_some())
                .map(|tx| tx.accession.clone())
                .collect(),
            AccessionKind::Protein => transcripts
                .iter()
                .filter_map(|tx| tx.protein_accession.clone())
                .collect(),
            AccessionKind::Genomic => {
                let from_gene = self
                    .gene_terms
                    .get(&symbol.to_lowercase())
                    .and_then(|(_, gene)| gene.location.as_ref())
                    .map(|loc| loc.accession.clone());
                from_gene
                    .into_iter()
                    .chain(
                        transcripts
                            .iter()
                            .flat_map(|tx| tx.alignments.values())
                            .map(|a| a.alt_ac.clone()),
                    )
                    .collect()
            }
        };
        let mut seen = std::collections::HashSet::new();
        accessions.retain(|ac| seen.insert(ac.clone()));
        Ok(accessions)
    }

    async fn get_transcript_for_protein(
        &self,
        protein_accession: &str,
    ) -> Result<Option<String>, FerroError> {
        let mut matches: Vec<&String> = self
            .transcripts
            .values()
            .filter(|tx| tx.protein_accession.as_deref() == Some(protein_accession))
            .map(|tx| &tx.accession)
            .collect();
        matches.sort();
        Ok(matches.first().map(|ac| ac.to_string()))
    }

    async fn get_alignment(
        &self,
        tx_accession: &str,
        assembly: Assembly,
    ) -> Result<Option<TranscriptAlignment>, FerroError> {
        Ok(self
            .transcripts
            .get(tx_accession)
            .and_then(|tx| tx.alignments.get(&assembly))
            .cloned())
    }

    async fn get_chromosome_assembly(
        &self,
        accession: &str,
    ) -> Result<Option<(String, Assembly)>, FerroError> {
        Ok(self.chromosomes.get(accession).cloned())
    }
}

#[async_trait]
impl GeneNormalizer for MockProvider {
    async fn normalize(&self, term: &str) -> Result<GeneMatch, FerroError> {
        Ok(match self.gene_terms.get(&term.to_lowercase()) {
            Some((match_type, gene)) => GeneMatch {
                match_type: *match_type,
                gene: Some(gene.clone()),
            },
            None => GeneMatch::no_match(),
        })
    }
}

#[async_trait]
impl LiftoverService for MockProvider {
    async fn get_liftover(
        &self,
        chromosome: &str,
        pos: u64,
        target: Assembly,
    ) -> Result<Option<(String, u64)>, FerroError> {
        let chrom = format!("chr{}", chromosome.trim_start_matches("chr"));
        Ok(self
            .liftover
            .iter()
            .find(|b| {
                b.target == target && b.chromosome == chrom && (b.start..=b.end).contains(&pos)
            })
            .map(|b| (b.to_chromosome.clone(), b.to_start + (pos - b.start))))
    }
}

#[async_trait]
impl AlleleNormalizer for MockProvider {
    async fn normalize(&self, allele: Allele, accession: &str) -> Result<Allele, FerroError> {
        if is_protein_accession(accession) {
            return Ok(allele);
        }
        let (start, end) = allele.location.interval().ok_or_else(|| FerroError::Normalization {
            msg: "allele location must have exact coordinates".to_string(),
        })?;
        let (_, sequence) = self.resolve(accession)?;
        let justified = justify(
            sequence.as_bytes(),
            start as usize,
            end as usize,
            allele.state.sequence.to_ascii_uppercase().as_bytes(),
        )?;
        let location = SequenceLocation::new(
            allele.location.refget_accession(),
            justified.start as u64,
            justified.end as u64,
        );
        Ok(Allele::new(
            location,
            String::from_utf8_lossy(&justified.state).into_owned(),
        ))
    }
}

#[async_trait]
impl PriorityResolver for MockProvider {
    async fn get_prioritized(
        &self,
        accession: &str,
        start: u64,
        end: u64,
        layer: AnnotationLayer,
        _gene: Option<&str>,
    ) -> Result<Option<PrioritizedLocation>, FerroError> {
        if let Some(entry) = self.mane.get(accession) {
            return Ok(Some(PrioritizedLocation {
                accession: entry.accession.clone(),
                start: Self::shift(start, entry.offset),
                end: Self::shift(end, entry.offset),
                status: entry.status,
                cds_start: entry.cds_start,
            }));
        }
        let on_grch38 = matches!(
            self.chromosomes.get(accession),
            Some((_, Assembly::GRCh38))
        );
        if layer == AnnotationLayer::Genomic && is_genomic_accession(accession) && on_grch38 {
            return Ok(Some(PrioritizedLocation {
                accession: accession.to_string(),
                start,
                end,
                status: TranscriptPriority::Grch38,
                cds_start: None,
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::transcript::GeneLocation;

    fn provider() -> MockProvider {
        let mut p = MockProvider::new();
        p.add_sequence("NC_000007.14", "ACGTACGTAC");
        p.add_chromosome("NC_000007.14", "chr7", Assembly::GRCh38);
        p.add_transcript(TranscriptEntry {
            accession: "NM_004333.6".to_string(),
            gene: Some("BRAF".to_string()),
            cds_start: Some(2),
            cds_end: Some(8),
            protein_accession: Some("NP_004324.2".to_string()),
            alignments: HashMap::new(),
        });
        p.add_gene_entry(GeneEntry {
            gene: Gene {
                symbol: "BRAF".to_string(),
                location: Some(GeneLocation {
                    accession: "NC_000007.14".to_string(),
                    start: 0,
                    end: 10,
                }),
            },
            concept_id: Some("hgnc:1097".to_string()),
            previous_symbols: vec![],
            aliases: vec!["BRAF1".to_string()],
        });
        p
    }

    #[tokio::test]
    async fn test_get_reference_sequence_modes() {
        let p = provider();
        let residue = p
            .get_reference_sequence("NC_000007.14", Some(2), Some(4), ResidueMode::Residue)
            .await
            .unwrap();
        assert_eq!(residue, "CGT");
        let single = p
            .get_reference_sequence("NC_000007.14", Some(2), None, ResidueMode::Residue)
            .await
            .unwrap();
        assert_eq!(single, "C");
        let inter = p
            .get_reference_sequence("NC_000007.14", Some(1), Some(4), ResidueMode::InterResidue)
            .await
            .unwrap();
        assert_eq!(inter, "CGT");
    }

    #[tokio::test]
    async fn test_get_reference_sequence_out_of_index() {
        let err = provider()
            .get_reference_sequence("NC_000007.14", Some(5), Some(20), ResidueMode::Residue)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "End inter-residue coordinate (20) is out of index on NC_000007.14"
        );
    }

    #[tokio::test]
    async fn test_translate_identifier_namespaces() {
        let p = provider();
        let ga4gh = p
            .translate_identifier("GRCh38:7", Some("ga4gh"))
            .await
            .unwrap();
        assert_eq!(ga4gh.len(), 1);
        assert!(ga4gh[0].starts_with("ga4gh:SQ."));

        let refseq = p
            .translate_identifier(&ga4gh[0], Some("refseq"))
            .await
            .unwrap();
        assert_eq!(refseq, vec!["refseq:NC_000007.14".to_string()]);
        assert!(p.translate_identifier("GRCh37:7", None).await.is_err());
    }

    #[tokio::test]
    async fn test_gene_normalization_match_types() {
        let p = provider();
        let symbol = GeneNormalizer::normalize(&p, "braf").await.unwrap();
        assert_eq!(symbol.match_type, MatchType::Symbol);
        let concept = GeneNormalizer::normalize(&p, "HGNC:1097").await.unwrap();
        assert_eq!(concept.match_type, MatchType::ConceptId);
        let alias = GeneNormalizer::normalize(&p, "BRAF1").await.unwrap();
        assert_eq!(alias.match_type, MatchType::Alias);
        assert_eq!(alias.matched().unwrap().symbol, "BRAF");
        let none = GeneNormalizer::normalize(&p, "V600E").await.unwrap();
        assert!(none.matched().is_none());
    }

    #[tokio::test]
    async fn test_accessions_for_gene() {
        let p = provider();
        assert_eq!(
            p.get_accessions_for_gene("BRAF", AccessionKind::Protein)
                .await
                .unwrap(),
            vec!["NP_004324.2".to_string()]
        );
        assert_eq!(
            p.get_accessions_for_gene("BRAF", AccessionKind::Genomic)
                .await
                .unwrap(),
            vec!["NC_000007.14".to_string()]
        );
        assert_eq!(
            p.get_transcript_for_protein("NP_004324.2").await.unwrap(),
            Some("NM_004333.6".to_string())
        );
    }

    #[tokio::test]
    async fn test_liftover_block() {
        let mut p = provider();
        p.add_liftover_block(LiftoverBlock {
            chromosome: "chr7".to_string(),
            start: 100,
            end: 200,
            target: Assembly::GRCh38,
            to_chromosome: "chr7".to_string(),
            to_start: 1100,
        });
        assert_eq!(
            p.get_liftover("7", 150, Assembly::GRCh38).await.unwrap(),
            Some(("chr7".to_string(), 1150))
        );
        assert_eq!(p.get_liftover("chr7", 201, Assembly::GRCh38).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prioritized_defaults_to_grch38() {
        let p = provider();
        let loc = p
            .get_prioritized("NC_000007.14", 1, 2, AnnotationLayer::Genomic, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loc.status, TranscriptPriority::Grch38);
        assert!(p
            .get_prioritized("NM_004333.6", 1, 2, AnnotationLayer::Cdna, None)
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "sequences": [{"accession": "NC_1.1", "sequence": "acgt", "aliases": ["GRCh38:chr1"]}],
            "genes": [{"symbol": "TEST", "location": null, "concept_id": null}]
        }"#;
        let p = MockProvider::from_json_str(json).unwrap();
        assert!(p.resolve("GRCh38:chr1").is_ok());
        assert_eq!(p.resolve("NC_1.1").unwrap().1, "ACGT");
    }
}
