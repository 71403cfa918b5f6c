//! Candidate accession resolution
//!
//! HGVS queries carry their accession. Free-text queries resolve candidates
//! from the gene symbol and gnomAD queries from the chromosome.

use crate::classify::{Classification, Nomenclature};
use crate::context::QueryContext;
use crate::reference::{AccessionKind, AnnotationLayer, Assembly};
use crate::translate::assembly::chromosome_accession;

/// Accessions to validate, or the error that makes the whole
/// classification invalid
pub async fn candidate_accessions(
    ctx: &QueryContext,
    classification: &Classification,
) -> Result<Vec<String>, String> {
    if classification.nomenclature == Nomenclature::Hgvs {
        return Ok(classification.accession.iter().cloned().collect());
    }

    match classification.variant.layer() {
        AnnotationLayer::Protein => {
            let gene = gene_symbol(classification)?;
            from_gene(ctx, gene, AccessionKind::Protein)
                .await
                .and_then(|acs| non_empty(acs, || {
                    format!("No protein accessions found for gene symbol: {}", gene)
                }))
        }
        AnnotationLayer::Cdna => {
            let gene = gene_symbol(classification)?;
            from_gene(ctx, gene, AccessionKind::Cdna)
                .await
                .and_then(|acs| non_empty(acs, || {
                    format!("No cDNA accessions found for gene symbol: {}", gene)
                }))
        }
        AnnotationLayer::Genomic => {
            let accessions = match classification.gnomad_vcf() {
                Some(vcf) => chromosome_accessions(ctx, &vcf.chromosome).await,
                None => match classification.gene.as_deref() {
                    Some(gene) => from_gene(ctx, gene, AccessionKind::Genomic).await?,
                    None => Vec::new(),
                },
            };
            non_empty(accessions, || "No genomic accessions found".to_string())
        }
    }
}

fn gene_symbol(classification: &Classification) -> Result<&str, String> {
    classification
        .gene
        .as_deref()
        .ok_or_else(|| "No gene symbol found for free text query".to_string())
}

fn non_empty(accessions: Vec<String>, message: impl FnOnce() -> String) -> Result<Vec<String>, String> {
    if accessions.is_empty() {
        Err(message())
    } else {
        Ok(accessions)
    }
}

async fn from_gene(
    ctx: &QueryContext,
    gene: &str,
    kind: AccessionKind,
) -> Result<Vec<String>, String> {
    ctx.get_accessions_for_gene(gene, kind)
        .await
        .map_err(|e| e.to_string())
}

/// RefSeq chromosome accessions on GRCh37 then GRCh38
pub async fn chromosome_accessions(ctx: &QueryContext, chromosome: &str) -> Vec<String> {
    let mut accessions = Vec::new();
    for assembly in [Assembly::GRCh37, Assembly::GRCh38] {
        accessions.extend(chromosome_accession(ctx, assembly, chromosome).await);
    }
    accessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::reference::{MockProvider, TranscriptEntry};
    use crate::tokenize::Tokenizer;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn provider() -> MockProvider {
        let mut provider = MockProvider::new();
        provider.add_sequence("NC_000007.13", "ACGT");
        provider.add_chromosome("NC_000007.13", "chr7", Assembly::GRCh37);
        provider.add_sequence("NC_000007.14", "ACGT");
        provider.add_chromosome("NC_000007.14", "chr7", Assembly::GRCh38);
        provider.add_transcript(TranscriptEntry {
            accession: "NM_004333.6".to_string(),
            gene: Some("BRAF".to_string()),
            cds_start: Some(10),
            cds_end: Some(100),
            protein_accession: Some("NP_004324.2".to_string()),
            alignments: HashMap::new(),
        });
        provider
    }

    fn classify(input: &str) -> Classification {
        let mut genes = HashMap::new();
        genes.insert("BRAF".to_string(), "BRAF".to_string());
        genes.insert("EGFR".to_string(), "EGFR".to_string());
        let tokens = Tokenizer::new().tokenize_with_genes(input, &genes);
        Classifier::new().unwrap().classify(&tokens).unwrap()
    }

    #[tokio::test]
    async fn test_hgvs_uses_embedded_accession() {
        let ctx = QueryContext::from_provider(Arc::new(provider()));
        let acs = candidate_accessions(&ctx, &classify("NC_000007.13:g.140453136A>T"))
            .await
            .unwrap();
        assert_eq!(acs, vec!["NC_000007.13"]);
    }

    #[tokio::test]
    async fn test_free_text_protein_and_cdna() {
        let ctx = QueryContext::from_provider(Arc::new(provider()));
        let protein = candidate_accessions(&ctx, &classify("BRAF V600E")).await.unwrap();
        assert_eq!(protein, vec!["NP_004324.2"]);
        let cdna = candidate_accessions(&ctx, &classify("BRAF c.1799T>A")).await.unwrap();
        assert_eq!(cdna, vec!["NM_004333.6"]);
    }

    #[tokio::test]
    async fn test_free_text_without_accessions() {
        let ctx = QueryContext::from_provider(Arc::new(provider()));
        let err = candidate_accessions(&ctx, &classify("EGFR L858R"))
            .await
            .unwrap_err();
        assert_eq!(err, "No protein accessions found for gene symbol: EGFR");
    }

    #[tokio::test]
    async fn test_gnomad_chromosome_accessions() {
        let ctx = QueryContext::from_provider(Arc::new(provider()));
        let acs = candidate_accessions(&ctx, &classify("7-140453136-A-T"))
            .await
            .unwrap();
        assert_eq!(acs, vec!["NC_000007.13", "NC_000007.14"]);

        let err = candidate_accessions(&ctx, &classify("9-100-A-T"))
            .await
            .unwrap_err();
        assert_eq!(err, "No genomic accessions found");
    }
}
