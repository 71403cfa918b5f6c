//! Tokenizer
//!
//! Splits a query on whitespace and runs each term through a priority-ordered
//! list of matchers. The first matcher that accepts a term wins; a term no
//! matcher accepts becomes an [`TokenPayload::Unknown`] token, so tokenization
//! never fails.
//!
//! Gene symbols are resolved by an external normalizer. [`Tokenizer::tokenize`]
//! emits a gene candidate for any symbol-shaped term left over after the
//! change matchers; [`Tokenizer::tokenize_with_genes`] instead takes the terms
//! already confirmed as genes and gives them precedence over the change
//! matchers, so a symbol such as `CDKN2A` is not read as a protein change.

pub mod free_text;
pub mod hgvs;
pub mod patterns;

use std::collections::HashMap;

use crate::token::{Token, TokenPayload};
use free_text::{AmplificationMatcher, FreeTextMatcher, GeneSymbolMatcher, MoleculeContext};
use hgvs::{GnomadVcfMatcher, HgvsMatcher};

/// A single-term grammar
pub trait Matcher: Send + Sync {
    /// Matcher name, for logging
    fn name(&self) -> &'static str;

    /// Return a token if this matcher accepts `term`
    fn match_term(&self, term: &str) -> Option<Token>;
}

/// Priority-ordered term matcher
pub struct Tokenizer {
    /// Whole-term grammars tried before gene lookup
    leading: Vec<Box<dyn Matcher>>,
    /// Change grammars tried after gene lookup
    trailing: Vec<Box<dyn Matcher>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            leading: vec![Box::new(HgvsMatcher), Box::new(GnomadVcfMatcher)],
            trailing: vec![
                Box::new(AmplificationMatcher),
                Box::new(FreeTextMatcher::new(MoleculeContext::Protein)),
                Box::new(FreeTextMatcher::new(MoleculeContext::Genomic)),
                Box::new(FreeTextMatcher::new(MoleculeContext::Cdna)),
            ],
        }
    }

    /// Terms of a query, in order
    pub fn terms(input: &str) -> impl Iterator<Item = &str> {
        input.split_whitespace()
    }

    /// Terms that should be looked up as gene symbols
    pub fn gene_candidates<'a>(&self, input: &'a str) -> Vec<&'a str> {
        Self::terms(input)
            .filter(|term| {
                patterns::GENE_SYMBOL.is_match(term)
                    && self.leading.iter().all(|m| m.match_term(term).is_none())
            })
            .collect()
    }

    /// Tokenize without gene knowledge.
    ///
    /// Unmatched symbol-shaped terms become gene candidates carrying the term
    /// as written.
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        Self::terms(input)
            .map(|term| {
                self.match_ordered(term, None)
                    .or_else(|| GeneSymbolMatcher.match_term(term))
                    .unwrap_or_else(|| unknown(term))
            })
            .collect()
    }

    /// Tokenize with confirmed genes.
    ///
    /// `genes` maps a term as written to its canonical gene symbol.
    pub fn tokenize_with_genes(&self, input: &str, genes: &HashMap<String, String>) -> Vec<Token> {
        Self::terms(input)
            .map(|term| {
                self.match_ordered(term, Some(genes))
                    .unwrap_or_else(|| unknown(term))
            })
            .collect()
    }

    fn match_ordered(&self, term: &str, genes: Option<&HashMap<String, String>>) -> Option<Token> {
        if let Some(token) = self.leading.iter().find_map(|m| m.match_term(term)) {
            return Some(token);
        }

        if let Some(symbol) = genes.and_then(|g| g.get(term)) {
            return Some(Token::new(
                term,
                symbol.as_str(),
                TokenPayload::Gene {
                    symbol: symbol.clone(),
                },
            ));
        }

        self.trailing.iter().find_map(|m| {
            let token = m.match_term(term)?;
            tracing::trace!(matcher = m.name(), term, "matched term");
            Some(token)
        })
    }
}

fn unknown(term: &str) -> Token {
    Token::new(term, term, TokenPayload::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.token_type()).collect()
    }

    #[test]
    fn test_tokenize_braf_v600e() {
        let tokens = Tokenizer::new().tokenize("BRAF V600E");
        assert_eq!(
            types(&tokens),
            vec![TokenType::Gene, TokenType::ProteinSubstitution]
        );
    }

    #[test]
    fn test_tokenize_hgvs() {
        let tokens = Tokenizer::new().tokenize("NC_000007.13:g.140453136A>T");
        assert_eq!(types(&tokens), vec![TokenType::Hgvs]);
    }

    #[test]
    fn test_tokenize_is_total() {
        assert!(Tokenizer::new().tokenize("").is_empty());
        let tokens = Tokenizer::new().tokenize("BRAF >>>");
        assert_eq!(types(&tokens), vec![TokenType::Gene, TokenType::Unknown]);
    }

    #[test]
    fn test_confirmed_gene_wins_over_protein_change() {
        let tokenizer = Tokenizer::new();
        assert_eq!(
            types(&tokenizer.tokenize("CDKN2A")),
            vec![TokenType::ProteinSubstitution]
        );

        let mut genes = HashMap::new();
        genes.insert("CDKN2A".to_string(), "CDKN2A".to_string());
        let tokens = tokenizer.tokenize_with_genes("CDKN2A Amplification", &genes);
        assert_eq!(
            types(&tokens),
            vec![TokenType::Gene, TokenType::Amplification]
        );
    }

    #[test]
    fn test_unconfirmed_gene_is_unknown() {
        let tokens = Tokenizer::new().tokenize_with_genes("NOTAGENE V600E", &HashMap::new());
        assert_eq!(
            types(&tokens),
            vec![TokenType::Unknown, TokenType::ProteinSubstitution]
        );
    }

    #[test]
    fn test_gene_candidates_skip_whole_term_matches() {
        let tokenizer = Tokenizer::new();
        assert_eq!(
            tokenizer.gene_candidates("braf V600E 7-140453136-A-T c.1799T>A"),
            vec!["braf", "V600E"]
        );
    }

    #[test]
    fn test_canonical_symbol_recorded() {
        let mut genes = HashMap::new();
        genes.insert("braf".to_string(), "BRAF".to_string());
        let tokens = Tokenizer::new().tokenize_with_genes("braf V600E", &genes);
        assert_eq!(tokens[0].gene_symbol(), Some("BRAF"));
        assert_eq!(tokens[0].input, "braf");
    }
}
