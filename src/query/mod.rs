//! Query orchestration
//!
//! [`QueryHandler`] runs the tokenize → classify → validate → translate
//! pipeline for each endpoint and packages the outcome as a response with a
//! `warnings` list. Nothing here returns an error: domain failures become
//! warnings, and anything unexpected is logged and reported as
//! [`UNHANDLED_WARNING`].

pub mod parsed;
pub mod response;

use std::collections::{HashMap, HashSet};

use crate::alignment::AlignmentMapper;
use crate::classify::{Classification, ClassificationType, Classifier};
use crate::context::QueryContext;
use crate::error::FerroError;
use crate::reference::{Assembly, ResidueMode, TranscriptPriority};
use crate::token::{Token, TokenType};
use crate::tokenize::Tokenizer;
use crate::translate::{
    AccessionPrioritizer, DupDelMode, Endpoint, TranslateOptions, TranslationResult, Translator,
};
use crate::validate::{ValidationResult, Validator};
use crate::vrs::{identify, CopyChange, CopyNumberChange, SequenceLocation, Variation};

pub use parsed::{
    Comparator, ParsedAssembly, ParsedCopyNumber, ParsedLocation, ParsedPosType,
    ParsedToCnVarQuery, ParsedToCxVarQuery,
};
pub use response::*;

/// Warning reported when an error escapes a pipeline stage
pub const UNHANDLED_WARNING: &str = "Unhandled exception. See logs for more information.";

/// Classification types accepted by the HGVS copy number endpoints
const COPY_NUMBER_TYPES: [ClassificationType; 4] = [
    ClassificationType::GenomicDuplication,
    ClassificationType::GenomicDeletion,
    ClassificationType::GenomicDuplicationAmbiguous,
    ClassificationType::GenomicDeletionAmbiguous,
];

/// Turn an error into a warning, hiding internal failures
fn warning_for(operation: &str, err: FerroError) -> String {
    match err {
        FerroError::Collaborator { .. }
        | FerroError::Io { .. }
        | FerroError::Json { .. }
        | FerroError::Config { .. }
        | FerroError::ConversionError { .. }
        | FerroError::AmbiguousGrammar { .. } => {
            tracing::error!(operation, code = %err.code(), error = %err, "unhandled error");
            UNHANDLED_WARNING.to_string()
        }
        FerroError::Timeout { .. } => {
            tracing::warn!(operation, error = %err, "collaborator timed out");
            err.to_string()
        }
        other => other.to_string(),
    }
}

/// Add a generic message when a query produced nothing and said nothing
fn warn_if_silent(label: &str, warnings: &mut Vec<String>) {
    if warnings.is_empty() {
        warnings.push(format!("Unable to translate {}", label));
    }
}

/// Entry point for every query operation
pub struct QueryHandler {
    ctx: QueryContext,
    tokenizer: Tokenizer,
    classifier: Classifier,
}

impl QueryHandler {
    pub fn new(ctx: QueryContext) -> Result<Self, FerroError> {
        Ok(Self {
            ctx,
            tokenizer: Tokenizer::new(),
            classifier: Classifier::new()?,
        })
    }

    pub fn context(&self) -> &QueryContext {
        &self.ctx
    }

    /// Tokenize with gene symbols resolved by the gene normalizer.
    ///
    /// Each term no matcher accepts yields an `Unable to tokenize` warning.
    pub async fn tokenize(&self, query: &str) -> (Vec<Token>, Vec<String>) {
        let mut genes = HashMap::new();
        for term in self.tokenizer.gene_candidates(query) {
            match self.ctx.normalize_gene(term).await {
                Ok(m) => {
                    if let Some(gene) = m.matched() {
                        genes.insert(term.to_string(), gene.symbol.clone());
                    }
                }
                Err(e) => tracing::warn!(term, error = %e, "gene normalization failed"),
            }
        }

        let tokens = self.tokenizer.tokenize_with_genes(query, &genes);
        let warnings = tokens
            .iter()
            .filter(|t| t.token_type() == TokenType::Unknown)
            .map(|t| format!("Unable to tokenize: {}", t.input))
            .collect();
        (tokens, warnings)
    }

    /// Tokenize and classify a query
    pub async fn classify(&self, query: &str) -> (Option<Classification>, Vec<String>) {
        let query = query.trim();
        let (tokens, warnings) = self.tokenize(query).await;
        if !warnings.is_empty() {
            return (None, warnings);
        }
        match self.classifier.classify(&tokens) {
            Some(classification) => (Some(classification), Vec::new()),
            None => (
                None,
                vec![format!("Unable to find classification for: {}", query)],
            ),
        }
    }

    async fn translations(
        &self,
        valid_results: &[ValidationResult],
        options: &TranslateOptions,
        warnings: &mut Vec<String>,
    ) -> Vec<TranslationResult> {
        let translator = Translator::new(&self.ctx);
        let mut translations: Vec<TranslationResult> = Vec::new();
        for result in valid_results {
            if let Some(tr) = translator.translate(result, options, warnings).await {
                if !translations.contains(&tr) {
                    translations.push(tr);
                }
            }
        }
        if translations.is_empty() && warnings.is_empty() {
            warnings.push("Unable to translate variation".to_string());
        }
        translations
    }

    /// Every distinct variation the query denotes, on its own accessions
    pub async fn to_vrs(&self, query: &str) -> ToVrsResponse {
        let mut response = ToVrsResponse {
            search_term: query.to_string(),
            variations: Vec::new(),
            warnings: Vec::new(),
            service_meta: ServiceMeta::now(),
        };

        let (classification, warnings) = self.classify(query).await;
        let Some(classification) = classification else {
            response.warnings = warnings;
            return response;
        };

        let summary = Validator::new(&self.ctx).summarize(&classification).await;
        if !summary.is_valid() {
            response.warnings = summary.warnings;
            return response;
        }

        let options = TranslateOptions::new(Endpoint::ToVrs);
        let translations = self
            .translations(&summary.valid_results, &options, &mut response.warnings)
            .await;

        let translator = Translator::new(&self.ctx);
        let mut seen = HashSet::new();
        for mut tr in translations {
            let id = tr.vrs_variation.id().map(str::to_string);
            if !seen.insert(id) {
                continue;
            }
            translator.annotate_sequence(&mut tr).await;
            response.variations.push(tr.vrs_variation);
        }
        tracing::debug!(
            query,
            variations = response.variations.len(),
            warnings = response.warnings.len(),
            "to_vrs complete"
        );
        response
    }

    /// The single representative variation for a query, lifted to GRCh38
    pub async fn normalize(
        &self,
        query: &str,
        dup_del_mode: DupDelMode,
        baseline_copies: Option<u64>,
        copy_change: Option<CopyChange>,
    ) -> NormalizeResponse {
        let label = query.trim();
        let mut response = NormalizeResponse {
            variation_query: query.to_string(),
            variation: None,
            warnings: Vec::new(),
            service_meta: ServiceMeta::now(),
        };

        let (tokens, mut warnings) = self.tokenize(label).await;
        if !warnings.is_empty() {
            warn_if_silent(label, &mut warnings);
            response.warnings = warnings;
            return response;
        }

        let gnomad_only = tokens.len() == 1 && tokens[0].token_type() == TokenType::GnomadVcf;
        let dup_del_mode = if gnomad_only {
            DupDelMode::Allele
        } else if dup_del_mode == DupDelMode::CopyNumberCount
            && !baseline_copies.is_some_and(|b| b > 0)
        {
            response
                .warnings
                .push(format!("{} mode requires `baseline_copies`", dup_del_mode));
            return response;
        } else {
            dup_del_mode
        };

        let Some(classification) = self.classifier.classify(&tokens) else {
            response
                .warnings
                .push(format!("Unable to find classification for: {}", query));
            return response;
        };

        let summary = Validator::new(&self.ctx).summarize(&classification).await;
        if !summary.is_valid() {
            response.warnings = summary.warnings;
            warn_if_silent(label, &mut response.warnings);
            return response;
        }

        let options = TranslateOptions {
            endpoint: Endpoint::Normalize,
            dup_del_mode,
            baseline_copies,
            copy_change,
            do_liftover: true,
        };
        let translations = self
            .translations(&summary.valid_results, &options, &mut response.warnings)
            .await;
        let Some(mut selected) = AccessionPrioritizer::select(translations) else {
            warn_if_silent(label, &mut response.warnings);
            return response;
        };

        let classification_type = selected
            .validation_result
            .classification
            .classification_type()
            .as_str();
        if selected.vrs_seq_loc_ac_status == TranscriptPriority::Na
            && (classification_type.starts_with("protein") || classification_type.starts_with("cdna"))
        {
            response
                .warnings
                .push("Unable to find MANE representation".to_string());
        }

        Translator::new(&self.ctx).annotate_sequence(&mut selected).await;
        tracing::debug!(
            query = label,
            accession = ?selected.vrs_seq_loc_ac,
            status = ?selected.vrs_seq_loc_ac_status,
            "normalized"
        );
        response.variation = Some(selected.vrs_variation);
        response
    }

    /// Valid results of an HGVS genomic duplication or deletion
    async fn copy_number_results(&self, hgvs_expr: &str) -> Result<Vec<ValidationResult>, Vec<String>> {
        let (classification, warnings) = self.classify(hgvs_expr).await;
        let classification = classification.ok_or(warnings)?;

        let has_hgvs = classification
            .matching_tokens
            .iter()
            .any(|t| t.token_type() == TokenType::Hgvs);
        if !has_hgvs || !COPY_NUMBER_TYPES.contains(&classification.classification_type()) {
            return Err(vec![format!(
                "{} is not a supported HGVS genomic duplication or deletion",
                hgvs_expr
            )]);
        }

        let summary = Validator::new(&self.ctx).summarize(&classification).await;
        if summary.is_valid() {
            Ok(summary.valid_results)
        } else {
            Err(summary.warnings)
        }
    }

    async fn copy_number_variation(
        &self,
        hgvs_expr: &str,
        options: TranslateOptions,
    ) -> (Option<Variation>, Vec<String>) {
        let valid_results = match self.copy_number_results(hgvs_expr).await {
            Ok(results) => results,
            Err(warnings) => return (None, warnings),
        };
        let mut warnings = Vec::new();
        let variation = self
            .translations(&valid_results, &options, &mut warnings)
            .await
            .into_iter()
            .next()
            .map(|tr| tr.vrs_variation);
        (variation, warnings)
    }

    pub async fn hgvs_to_copy_number_count(
        &self,
        hgvs_expr: &str,
        baseline_copies: u64,
        do_liftover: bool,
    ) -> HgvsToCopyNumberCountResponse {
        let options = TranslateOptions {
            endpoint: Endpoint::HgvsToCopyNumberCount,
            dup_del_mode: DupDelMode::CopyNumberCount,
            baseline_copies: Some(baseline_copies),
            copy_change: None,
            do_liftover,
        };
        let (variation, warnings) = self.copy_number_variation(hgvs_expr, options).await;
        HgvsToCopyNumberCountResponse {
            hgvs_expr: hgvs_expr.to_string(),
            copy_number_count: match variation {
                Some(Variation::CopyNumberCount(cn)) => Some(cn),
                _ => None,
            },
            warnings,
            service_meta: ServiceMeta::now(),
        }
    }

    pub async fn hgvs_to_copy_number_change(
        &self,
        hgvs_expr: &str,
        copy_change: Option<CopyChange>,
        do_liftover: bool,
    ) -> HgvsToCopyNumberChangeResponse {
        let options = TranslateOptions {
            endpoint: Endpoint::HgvsToCopyNumberChange,
            dup_del_mode: DupDelMode::CopyNumberChange,
            baseline_copies: None,
            copy_change,
            do_liftover,
        };
        let (variation, warnings) = self.copy_number_variation(hgvs_expr, options).await;
        HgvsToCopyNumberChangeResponse {
            hgvs_expr: hgvs_expr.to_string(),
            copy_number_change: match variation {
                Some(Variation::CopyNumberChange(cx)) => Some(cx),
                _ => None,
            },
            warnings,
            service_meta: ServiceMeta::now(),
        }
    }

    pub async fn parsed_to_cn_var(&self, query: &ParsedToCnVarQuery) -> ParsedToCnVarResponse {
        let mut response = ParsedToCnVarResponse {
            copy_number_count: None,
            warnings: Vec::new(),
            service_meta: ServiceMeta::now(),
        };
        if let Err(message) = query.validate() {
            response.warnings.push(message);
            return response;
        }
        match ParsedCopyNumber::new(&self.ctx).copy_number_count(query).await {
            Ok(cn) => response.copy_number_count = Some(cn),
            Err(e) => response.warnings.push(warning_for("parsed_to_cn_var", e)),
        }
        response
    }

    pub async fn parsed_to_cx_var(&self, query: &ParsedToCxVarQuery) -> ParsedToCxVarResponse {
        let mut response = ParsedToCxVarResponse {
            copy_number_change: None,
            warnings: Vec::new(),
            service_meta: ServiceMeta::now(),
        };
        if let Err(message) = query.validate() {
            response.warnings.push(message);
            return response;
        }
        match ParsedCopyNumber::new(&self.ctx).copy_number_change(query).await {
            Ok(cx) => response.copy_number_change = Some(cx),
            Err(e) => response.warnings.push(warning_for("parsed_to_cx_var", e)),
        }
        response
    }

    /// High-level gain over a gene, or over an explicit location when
    /// `sequence_id`, `start` and `end` are all given
    pub async fn amplification_to_cx_var(
        &self,
        query: AmplificationQuery,
    ) -> AmplificationToCxVarResponse {
        let mut response = AmplificationToCxVarResponse {
            query,
            amplification_label: None,
            copy_number_change: None,
            warnings: Vec::new(),
            service_meta: ServiceMeta::now(),
        };
        let query = &response.query;

        let gene = match self.ctx.normalize_gene(&query.gene).await {
            Ok(m) => m.matched().cloned(),
            Err(e) => {
                response
                    .warnings
                    .push(warning_for("amplification_to_cx_var", e));
                return response;
            }
        };
        let Some(gene) = gene else {
            response.warnings.push(format!(
                "gene-normalizer returned no match for gene: {}",
                query.gene
            ));
            return response;
        };
        let label = format!("{} Amplification", gene.symbol);

        let location = match (&query.sequence_id, query.start, query.end) {
            (Some(sequence_id), Some(start), Some(end)) => {
                self.explicit_location(sequence_id, start, end).await
            }
            _ => match &gene.location {
                Some(loc) => self
                    .ctx
                    .refget_accession(&loc.accession)
                    .await
                    .map(|refget| SequenceLocation::new(&refget, loc.start, loc.end)),
                None => Err(FerroError::resolution(format!(
                    "gene-normalizer could not find a priority sequence location for gene: {}",
                    gene.symbol
                ))),
            },
        };
        response.amplification_label = Some(label);

        match location {
            Ok(location) => {
                let mut variation = Variation::CopyNumberChange(CopyNumberChange {
                    id: None,
                    digest: None,
                    label: None,
                    location,
                    copy_change: CopyChange::HighLevelGain,
                });
                identify(&mut variation);
                if let Variation::CopyNumberChange(cx) = variation {
                    response.copy_number_change = Some(cx);
                }
            }
            Err(e) => response
                .warnings
                .push(warning_for("amplification_to_cx_var", e)),
        }
        response
    }

    /// Location over residues `start..=end` after checking they exist
    async fn explicit_location(
        &self,
        sequence_id: &str,
        start: u64,
        end: u64,
    ) -> Result<SequenceLocation, FerroError> {
        let refget = self
            .ctx
            .translate_identifier(sequence_id, Some("ga4gh"))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FerroError::ReferenceNotFound {
                id: sequence_id.to_string(),
            })?;
        self.ctx
            .get_reference_sequence(sequence_id, Some(start), Some(end), ResidueMode::Residue)
            .await?;
        Ok(SequenceLocation::new(&refget, start.saturating_sub(1), end))
    }

    pub async fn p_to_c(
        &self,
        p_ac: &str,
        start: u64,
        end: u64,
        residue_mode: ResidueMode,
    ) -> ToCdnaResponse {
        let result = AlignmentMapper::new(&self.ctx)
            .p_to_c(p_ac, start, end, residue_mode)
            .await;
        let (c_data, warnings) = match result {
            Ok(data) => (Some(data), Vec::new()),
            Err(e) => (None, vec![warning_for("p_to_c", e)]),
        };
        ToCdnaResponse {
            c_data,
            warnings,
            service_meta: ServiceMeta::now(),
        }
    }

    pub async fn c_to_g(
        &self,
        c_ac: &str,
        start: u64,
        end: u64,
        cds_start: Option<u64>,
        residue_mode: ResidueMode,
        target: Assembly,
    ) -> ToGenomicResponse {
        let result = AlignmentMapper::new(&self.ctx)
            .c_to_g(c_ac, start, end, cds_start, residue_mode, target)
            .await;
        genomic_response("c_to_g", result)
    }

    pub async fn p_to_g(
        &self,
        p_ac: &str,
        start: u64,
        end: u64,
        residue_mode: ResidueMode,
        target: Assembly,
    ) -> ToGenomicResponse {
        let result = AlignmentMapper::new(&self.ctx)
            .p_to_g(p_ac, start, end, residue_mode, target)
            .await;
        genomic_response("p_to_g", result)
    }
}

fn genomic_response(
    operation: &str,
    result: Result<crate::alignment::GenomicRepresentation, FerroError>,
) -> ToGenomicResponse {
    let (g_data, warnings) = match result {
        Ok(data) => (Some(data), Vec::new()),
        Err(e) => (None, vec![warning_for(operation, e)]),
    };
    ToGenomicResponse {
        g_data,
        warnings,
        service_meta: ServiceMeta::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Gene, GeneLocation, MockProvider, TranscriptEntry};
    use crate::vrs::Coordinate;
    use std::sync::Arc;

    const GENOMIC_37: &str = "TTGCAGCAGCATTACGGACT";

    fn handler() -> QueryHandler {
        let mut provider = MockProvider::new();
        provider.add_sequence(
            "NP_004324.2",
            format!("{}V{}", "A".repeat(599), "K".repeat(10)),
        );
        provider.add_sequence("NM_004333.6", "CCATGACGTAA");
        provider.add_transcript(TranscriptEntry {
            accession: "NM_004333.6".to_string(),
            gene: Some("BRAF".to_string()),
            cds_start: Some(2),
            cds_end: Some(11),
            protein_accession: Some("NP_004324.2".to_string()),
            alignments: HashMap::new(),
        });
        provider.add_sequence("NC_000007.13", GENOMIC_37);
        provider.add_chromosome("NC_000007.13", "chr7", Assembly::GRCh37);
        provider.add_sequence("NC_000007.14", format!("AAAA{}", GENOMIC_37));
        provider.add_chromosome("NC_000007.14", "chr7", Assembly::GRCh38);
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
        QueryHandler::new(QueryContext::from_provider(Arc::new(provider))).unwrap()
    }

    #[tokio::test]
    async fn test_to_vrs_annotates_sequence() {
        let response = handler().to_vrs("BRAF V600E").await;
        assert!(response.warnings.is_empty(), "{:?}", response.warnings);
        assert_eq!(response.variations.len(), 1);
        let location = response.variations[0].location();
        assert_eq!(location.interval(), Some((599, 600)));
        assert_eq!(location.sequence.as_deref(), Some("V"));
    }

    #[tokio::test]
    async fn test_tokenize_and_classify_failures() {
        let handler = handler();
        let response = handler.to_vrs("NOTAGENE V600E").await;
        assert!(response.variations.is_empty());
        assert_eq!(response.warnings, vec!["Unable to tokenize: NOTAGENE"]);

        let response = handler.to_vrs("V600E").await;
        assert_eq!(
            response.warnings,
            vec!["Unable to find classification for: V600E"]
        );
    }

    #[tokio::test]
    async fn test_normalize_warns_without_mane() {
        let response = handler()
            .normalize("BRAF V600E", DupDelMode::Default, None, None)
            .await;
        assert!(response.variation.is_some());
        assert_eq!(response.warnings, vec!["Unable to find MANE representation"]);
    }

    #[tokio::test]
    async fn test_normalize_copy_number_count_requires_baseline() {
        let response = handler()
            .normalize(
                "NC_000007.13:g.7_9dup",
                DupDelMode::CopyNumberCount,
                None,
                None,
            )
            .await;
        assert!(response.variation.is_none());
        assert_eq!(
            response.warnings,
            vec!["copy_number_count mode requires `baseline_copies`"]
        );
    }

    #[tokio::test]
    async fn test_normalize_untokenizable_query() {
        let response = handler()
            .normalize("NOTAGENE V600E", DupDelMode::Default, None, None)
            .await;
        assert_eq!(response.warnings, vec!["Unable to tokenize: NOTAGENE"]);
    }

    #[tokio::test]
    async fn test_hgvs_to_copy_number_count() {
        let response = handler()
            .hgvs_to_copy_number_count("NC_000007.13:g.7_9dup", 3, false)
            .await;
        assert!(response.warnings.is_empty(), "{:?}", response.warnings);
        let cn = response.copy_number_count.unwrap();
        assert_eq!(cn.copies, Coordinate::Number(4));
        assert_eq!(cn.location.interval(), Some((6, 9)));
    }

    #[tokio::test]
    async fn test_hgvs_to_copy_number_rejects_other_variants() {
        let response = handler()
            .hgvs_to_copy_number_change("BRAF V600E", None, false)
            .await;
        assert!(response.copy_number_change.is_none());
        assert_eq!(
            response.warnings,
            vec!["BRAF V600E is not a supported HGVS genomic duplication or deletion"]
        );
    }

    #[tokio::test]
    async fn test_amplification_from_gene_location() {
        let response = handler()
            .amplification_to_cx_var(AmplificationQuery {
                gene: "braf".to_string(),
                ..Default::default()
            })
            .await;
        assert!(response.warnings.is_empty(), "{:?}", response.warnings);
        assert_eq!(response.amplification_label.as_deref(), Some("BRAF Amplification"));
        let cx = response.copy_number_change.unwrap();
        assert_eq!(cx.copy_change, CopyChange::HighLevelGain);
        assert_eq!(cx.location.interval(), Some((4, 24)));
        assert!(cx.id.unwrap().starts_with("ga4gh:CX."));
    }

    #[tokio::test]
    async fn test_amplification_explicit_location_and_failures() {
        let handler = handler();
        let response = handler
            .amplification_to_cx_var(AmplificationQuery {
                gene: "BRAF".to_string(),
                sequence_id: Some("NC_000007.14".to_string()),
                start: Some(2),
                end: Some(5),
            })
            .await;
        assert_eq!(
            response.copy_number_change.unwrap().location.interval(),
            Some((1, 5))
        );

        let response = handler
            .amplification_to_cx_var(AmplificationQuery {
                gene: "NOPE".to_string(),
                ..Default::default()
            })
            .await;
        assert_eq!(
            response.warnings,
            vec!["gene-normalizer returned no match for gene: NOPE"]
        );
        assert!(response.amplification_label.is_none());

        let response = handler
            .amplification_to_cx_var(AmplificationQuery {
                gene: "EGFR".to_string(),
                ..Default::default()
            })
            .await;
        assert_eq!(
            response.warnings,
            vec!["gene-normalizer could not find a priority sequence location for gene: EGFR"]
        );
        assert_eq!(response.amplification_label.as_deref(), Some("EGFR Amplification"));
    }

    #[tokio::test]
    async fn test_alignment_errors_become_warnings() {
        let response = handler().p_to_c("NP_999.1", 1, 2, ResidueMode::Residue).await;
        assert!(response.c_data.is_none());
        assert_eq!(
            response.warnings,
            vec!["Unable to find cDNA accession for NP_999.1"]
        );
    }

    #[test]
    fn test_unexpected_errors_are_hidden() {
        let warning = warning_for("test", FerroError::collaborator("seqrepo", "connection reset"));
        assert_eq!(warning, UNHANDLED_WARNING);
        let warning = warning_for("test", FerroError::resolution("Unknown assembly: hg17"));
        assert_eq!(warning, "Unknown assembly: hg17");
    }
}
