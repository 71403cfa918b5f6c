//! Declarative classification grammar
//!
//! Each rule lists the exact token-type sequences it accepts. A query is
//! classified by the single rule whose sequence equals its token types, so no
//! two rules may declare the same sequence.

use std::collections::HashMap;

use crate::classify::types::ClassificationType;
use crate::error::FerroError;
use crate::token::TokenType;

/// What a matched rule produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    /// Free-text gene + change
    FreeText(ClassificationType),
    /// A lone HGVS token; the change grammar picks the classification
    Hgvs,
    /// A lone gnomAD VCF token; ref/alt diffing picks the classification
    GnomadVcf,
}

impl RuleTarget {
    fn label(&self) -> String {
        match self {
            RuleTarget::FreeText(t) => t.to_string(),
            RuleTarget::Hgvs => "hgvs".to_string(),
            RuleTarget::GnomadVcf => "gnomad_vcf".to_string(),
        }
    }
}

/// One grammar rule
#[derive(Debug, Clone, Copy)]
pub struct GrammarRule {
    pub target: RuleTarget,
    pub sequences: &'static [&'static [TokenType]],
}

macro_rules! gene_then {
    ($classification:ident, $token:ident) => {
        GrammarRule {
            target: RuleTarget::FreeText(ClassificationType::$classification),
            sequences: &[&[TokenType::Gene, TokenType::$token]],
        }
    };
}

/// The classification grammar
pub static GRAMMAR: &[GrammarRule] = &[
    GrammarRule {
        target: RuleTarget::Hgvs,
        sequences: &[&[TokenType::Hgvs]],
    },
    GrammarRule {
        target: RuleTarget::GnomadVcf,
        sequences: &[&[TokenType::GnomadVcf]],
    },
    gene_then!(ProteinSubstitution, ProteinSubstitution),
    gene_then!(ProteinStopGain, ProteinStopGain),
    gene_then!(ProteinReferenceAgree, ProteinReferenceAgree),
    gene_then!(ProteinDelins, ProteinDelins),
    gene_then!(ProteinDeletion, ProteinDeletion),
    gene_then!(ProteinInsertion, ProteinInsertion),
    GrammarRule {
        target: RuleTarget::FreeText(ClassificationType::CdnaSubstitution),
        sequences: &[
            &[TokenType::Gene, TokenType::CdnaSubstitution],
            &[
                TokenType::Gene,
                TokenType::ProteinSubstitution,
                TokenType::CdnaSubstitution,
            ],
        ],
    },
    GrammarRule {
        target: RuleTarget::FreeText(ClassificationType::CdnaReferenceAgree),
        sequences: &[
            &[TokenType::Gene, TokenType::CdnaReferenceAgree],
            &[
                TokenType::Gene,
                TokenType::ProteinSubstitution,
                TokenType::CdnaReferenceAgree,
            ],
        ],
    },
    gene_then!(CdnaDelins, CdnaDelins),
    gene_then!(CdnaDeletion, CdnaDeletion),
    gene_then!(CdnaInsertion, CdnaInsertion),
    gene_then!(GenomicSubstitution, GenomicSubstitution),
    gene_then!(GenomicReferenceAgree, GenomicReferenceAgree),
    gene_then!(GenomicDelins, GenomicDelins),
    gene_then!(GenomicDeletion, GenomicDeletion),
    gene_then!(GenomicInsertion, GenomicInsertion),
    gene_then!(GenomicDuplication, GenomicDuplication),
    gene_then!(GenomicDuplicationAmbiguous, GenomicDuplicationAmbiguous),
    gene_then!(GenomicDeletionAmbiguous, GenomicDeletionAmbiguous),
    gene_then!(Amplification, Amplification),
];

fn render(sequence: &[TokenType]) -> String {
    let names: Vec<&str> = sequence.iter().map(|t| t.as_str()).collect();
    format!("[{}]", names.join(", "))
}

/// Index the rules by sequence, failing on any duplicate
pub fn index_rules(rules: &[GrammarRule]) -> Result<HashMap<Vec<TokenType>, RuleTarget>, FerroError> {
    let mut index: HashMap<Vec<TokenType>, RuleTarget> = HashMap::new();
    for rule in rules {
        for sequence in rule.sequences {
            if let Some(existing) = index.insert(sequence.to_vec(), rule.target) {
                return Err(FerroError::AmbiguousGrammar {
                    first: existing.label(),
                    second: rule.target.label(),
                    sequence: render(sequence),
                });
            }
        }
    }
    Ok(index)
}
