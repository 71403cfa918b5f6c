//! Free-text change matchers
//!
//! A free-text term is a change expression with an optional coordinate prefix,
//! e.g. `V600E`, `p.(Val600Glu)`, `c.1799T>A` or `g.20189349dup`. The same
//! change grammars are reused to interpret the change part of HGVS tokens.

use crate::token::amino_acid::normalize_group;
use crate::token::{
    AmbiguousPos, AmbiguousRange, AmbiguousShape, Deletion, Delins, Duplication, Insertion,
    ProteinDeletion, ProteinDelins, ProteinInsertion, ProteinSpan, Substitution, Token,
    TokenPayload,
};
use crate::tokenize::patterns;
use crate::tokenize::Matcher;
use regex::Captures;

/// Molecule context a change expression is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoleculeContext {
    Protein,
    Cdna,
    Genomic,
}

impl MoleculeContext {
    fn prefix(&self) -> &'static str {
        match self {
            MoleculeContext::Protein => "p.",
            MoleculeContext::Cdna => "c.",
            MoleculeContext::Genomic => "g.",
        }
    }
}

/// Strip a coordinate prefix and any wrapping parentheses.
///
/// Returns `None` when the term carries a prefix for a different context.
/// Protein terms may be bare; cDNA and genomic terms need their prefix.
pub fn strip_coordinate_prefix(term: &str, context: MoleculeContext) -> Option<&str> {
    let prefix = context.prefix();

    let stripped = if let Some(inner) = term
        .strip_prefix('(')
        .and_then(|t| t.strip_prefix(prefix))
        .and_then(|t| t.strip_suffix(')'))
    {
        // (p.X)
        inner
    } else if let Some(rest) = term.strip_prefix(prefix) {
        // p.(X) or p.X
        rest.strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(rest)
    } else if has_any_coordinate_prefix(term) {
        return None;
    } else if context == MoleculeContext::Protein {
        term.strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(term)
    } else {
        return None;
    };

    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

fn has_any_coordinate_prefix(term: &str) -> bool {
    let term = term.strip_prefix('(').unwrap_or(term);
    let mut chars = term.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('c' | 'g' | 'n' | 'p' | 'r' | 'm'), Some('.'))
    )
}

fn capture_u64(caps: &Captures<'_>, name: &str) -> Option<u64> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

fn capture_str(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_string())
}

/// Parse a change expression (prefix already stripped) in the given context.
pub fn parse_change(context: MoleculeContext, change: &str) -> Option<TokenPayload> {
    match context {
        MoleculeContext::Protein => parse_protein_change(change),
        MoleculeContext::Cdna => parse_cdna_change(change),
        MoleculeContext::Genomic => parse_genomic_change(change),
    }
}

fn parse_protein_change(change: &str) -> Option<TokenPayload> {
    if let Some(caps) = patterns::PROTEIN_DELINS.captures(change) {
        let (_, aa) = normalize_group(&[
            caps.name("aa0").map(|m| m.as_str()),
            caps.name("aa1").map(|m| m.as_str()),
            caps.name("inserted_sequence").map(|m| m.as_str()),
        ])?;
        let mut aa = aa.into_iter();
        let aa0 = aa.next().flatten()?;
        let aa1 = aa.next().flatten();
        let inserted_sequence = aa.next().flatten()?;
        return Some(TokenPayload::ProteinDelins(ProteinDelins {
            span: ProteinSpan {
                aa0,
                pos0: capture_u64(&caps, "pos0")?,
                aa1,
                pos1: capture_u64(&caps, "pos1"),
            },
            inserted_sequence,
        }));
    }

    if let Some(caps) = patterns::PROTEIN_DELETION.captures(change) {
        let (_, aa) = normalize_group(&[
            caps.name("aa0").map(|m| m.as_str()),
            caps.name("aa1").map(|m| m.as_str()),
            caps.name("deleted_sequence").map(|m| m.as_str()),
        ])?;
        let mut aa = aa.into_iter();
        let aa0 = aa.next().flatten()?;
        let aa1 = aa.next().flatten();
        let deleted_sequence = aa.next().flatten();
        return Some(TokenPayload::ProteinDeletion(ProteinDeletion {
            span: ProteinSpan {
                aa0,
                pos0: capture_u64(&caps, "pos0")?,
                aa1,
                pos1: capture_u64(&caps, "pos1"),
            },
            deleted_sequence,
        }));
    }

    if let Some(caps) = patterns::PROTEIN_SUBSTITUTION.captures(change) {
        let pos = capture_u64(&caps, "pos")?;
        let ref_raw = caps.name("ref")?.as_str();
        let alt_raw = caps.name("alt")?.as_str();

        // A lone stop is valid next to either convention
        if alt_raw == "Ter" || alt_raw == "*" {
            let (_, aa) = normalize_group(&[Some(ref_raw)])?;
            let ref_ = aa.into_iter().next().flatten()?;
            return Some(TokenPayload::ProteinStopGain(Substitution {
                pos,
                ref_,
                alt: "*".to_string(),
            }));
        }

        let (_, aa) = normalize_group(&[Some(ref_raw), Some(alt_raw)])?;
        let mut aa = aa.into_iter();
        let ref_ = aa.next().flatten()?;
        let alt = aa.next().flatten()?;
        let substitution = Substitution { pos, ref_, alt };
        return Some(if substitution.alt == "*" {
            TokenPayload::ProteinStopGain(substitution)
        } else {
            TokenPayload::ProteinSubstitution(substitution)
        });
    }

    if let Some(caps) = patterns::PROTEIN_REFERENCE_AGREE.captures(change) {
        let (_, aa) = normalize_group(&[caps.name("ref").map(|m| m.as_str())])?;
        return Some(TokenPayload::ProteinReferenceAgree {
            pos: capture_u64(&caps, "pos")?,
            ref_: aa.into_iter().next().flatten()?,
        });
    }

    if let Some(caps) = patterns::PROTEIN_INSERTION.captures(change) {
        let (_, aa) = normalize_group(&[
            caps.name("aa0").map(|m| m.as_str()),
            caps.name("aa1").map(|m| m.as_str()),
            caps.name("inserted_sequence").map(|m| m.as_str()),
        ])?;
        let mut aa = aa.into_iter();
        return Some(TokenPayload::ProteinInsertion(ProteinInsertion {
            aa0: aa.next().flatten()?,
            pos0: capture_u64(&caps, "pos0")?,
            aa1: aa.next().flatten()?,
            pos1: capture_u64(&caps, "pos1")?,
            inserted_sequence: aa.next().flatten()?,
        }));
    }

    None
}

/// Nucleotide changes shared by cDNA and genomic contexts
enum NucleotideChange {
    Delins(Delins),
    Deletion(Deletion),
    Substitution(Substitution),
    ReferenceAgree(u64),
    Insertion(Insertion),
}

fn parse_nucleotide_change(change: &str) -> Option<NucleotideChange> {
    if let Some(caps) = patterns::NUC_DELINS.captures(change) {
        return Some(NucleotideChange::Delins(Delins {
            pos0: capture_u64(&caps, "pos0")?,
            pos1: capture_u64(&caps, "pos1"),
            inserted_sequence: capture_str(&caps, "inserted_sequence")?,
        }));
    }
    if let Some(caps) = patterns::NUC_DELETION.captures(change) {
        return Some(NucleotideChange::Deletion(Deletion {
            pos0: capture_u64(&caps, "pos0")?,
            pos1: capture_u64(&caps, "pos1"),
            deleted_sequence: capture_str(&caps, "deleted_sequence"),
        }));
    }
    if let Some(caps) = patterns::NUC_SUBSTITUTION.captures(change) {
        return Some(NucleotideChange::Substitution(Substitution {
            pos: capture_u64(&caps, "pos")?,
            ref_: capture_str(&caps, "ref")?,
            alt: capture_str(&caps, "alt")?,
        }));
    }
    if let Some(caps) = patterns::NUC_REFERENCE_AGREE.captures(change) {
        return Some(NucleotideChange::ReferenceAgree(capture_u64(&caps, "pos")?));
    }
    if let Some(caps) = patterns::NUC_INSERTION.captures(change) {
        return Some(NucleotideChange::Insertion(Insertion {
            pos0: capture_u64(&caps, "pos0")?,
            pos1: capture_u64(&caps, "pos1")?,
            inserted_sequence: capture_str(&caps, "inserted_sequence")?,
        }));
    }
    None
}

fn parse_cdna_change(change: &str) -> Option<TokenPayload> {
    Some(match parse_nucleotide_change(change)? {
        NucleotideChange::Delins(d) => TokenPayload::CdnaDelins(d),
        NucleotideChange::Deletion(d) => TokenPayload::CdnaDeletion(d),
        NucleotideChange::Substitution(s) => TokenPayload::CdnaSubstitution(s),
        NucleotideChange::ReferenceAgree(pos) => TokenPayload::CdnaReferenceAgree { pos },
        NucleotideChange::Insertion(i) => TokenPayload::CdnaInsertion(i),
    })
}

fn parse_genomic_change(change: &str) -> Option<TokenPayload> {
    if let Some(nucleotide) = parse_nucleotide_change(change) {
        return Some(match nucleotide {
            NucleotideChange::Delins(d) => TokenPayload::GenomicDelins(d),
            NucleotideChange::Deletion(d) => TokenPayload::GenomicDeletion(d),
            NucleotideChange::Substitution(s) => TokenPayload::GenomicSubstitution(s),
            NucleotideChange::ReferenceAgree(pos) => TokenPayload::GenomicReferenceAgree { pos },
            NucleotideChange::Insertion(i) => TokenPayload::GenomicInsertion(i),
        });
    }

    if let Some(caps) = patterns::GENOMIC_DUPLICATION.captures(change) {
        return Some(TokenPayload::GenomicDuplication(Duplication {
            pos0: capture_u64(&caps, "pos0")?,
            pos1: capture_u64(&caps, "pos1"),
        }));
    }

    parse_ambiguous(change)
}

fn ambiguous_pos(caps: &Captures<'_>, name: &str) -> Option<AmbiguousPos> {
    caps.name(name).and_then(|m| AmbiguousPos::parse(m.as_str()))
}

fn parse_ambiguous(change: &str) -> Option<TokenPayload> {
    let (caps, range) = if let Some(caps) = patterns::AMBIGUOUS_BOTH_BRACKETED.captures(change) {
        let range = AmbiguousRange {
            pos0: ambiguous_pos(&caps, "pos0")?,
            pos1: ambiguous_pos(&caps, "pos1"),
            pos2: ambiguous_pos(&caps, "pos2")?,
            pos3: ambiguous_pos(&caps, "pos3"),
            shape: AmbiguousShape::BothBracketed,
        };
        // (?_?)_(#_#), (#_#)_(?_?) and (?_?)_(?_?) carry no usable bound
        let start_unknown = range.pos0.is_unknown() && range.pos1.is_some_and(|p| p.is_unknown());
        let end_unknown = range.pos2.is_unknown() && range.pos3.is_some_and(|p| p.is_unknown());
        if start_unknown || end_unknown {
            return None;
        }
        (caps, range)
    } else if let Some(caps) = patterns::AMBIGUOUS_START_BRACKETED.captures(change) {
        let range = AmbiguousRange {
            pos0: ambiguous_pos(&caps, "pos0")?,
            pos1: ambiguous_pos(&caps, "pos1"),
            pos2: ambiguous_pos(&caps, "pos2")?,
            pos3: None,
            shape: AmbiguousShape::StartBracketed,
        };
        (caps, range)
    } else if let Some(caps) = patterns::AMBIGUOUS_END_BRACKETED.captures(change) {
        let range = AmbiguousRange {
            pos0: ambiguous_pos(&caps, "pos0")?,
            pos1: None,
            pos2: ambiguous_pos(&caps, "pos2")?,
            pos3: ambiguous_pos(&caps, "pos3"),
            shape: AmbiguousShape::EndBracketed,
        };
        (caps, range)
    } else {
        return None;
    };

    match caps.name("kind")?.as_str() {
        "dup" => Some(TokenPayload::GenomicDuplicationAmbiguous(range)),
        "del" => Some(TokenPayload::GenomicDeletionAmbiguous(range)),
        _ => None,
    }
}

/// Matches free-text change expressions in one molecule context
pub struct FreeTextMatcher {
    context: MoleculeContext,
}

impl FreeTextMatcher {
    pub fn new(context: MoleculeContext) -> Self {
        Self { context }
    }
}

impl Matcher for FreeTextMatcher {
    fn name(&self) -> &'static str {
        match self.context {
            MoleculeContext::Protein => "protein",
            MoleculeContext::Cdna => "cdna",
            MoleculeContext::Genomic => "genomic",
        }
    }

    fn match_term(&self, term: &str) -> Option<Token> {
        let change = strip_coordinate_prefix(term, self.context)?;
        let payload = parse_change(self.context, change)?;
        Some(Token::new(term, change, payload))
    }
}

/// Matches the `amplification` keyword
pub struct AmplificationMatcher;

impl Matcher for AmplificationMatcher {
    fn name(&self) -> &'static str {
        "amplification"
    }

    fn match_term(&self, term: &str) -> Option<Token> {
        patterns::AMPLIFICATION
            .is_match(term)
            .then(|| Token::new(term, "amplification", TokenPayload::Amplification))
    }
}

/// Emits a gene-symbol candidate for symbol-shaped terms.
///
/// Candidates are confirmed (and canonicalized) against the gene normalizer
/// by the query layer.
pub struct GeneSymbolMatcher;

impl Matcher for GeneSymbolMatcher {
    fn name(&self) -> &'static str {
        "gene_symbol"
    }

    fn match_term(&self, term: &str) -> Option<Token> {
        patterns::GENE_SYMBOL.is_match(term).then(|| {
            Token::new(
                term,
                term,
                TokenPayload::Gene {
                    symbol: term.to_string(),
                },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn test_strip_protein_prefix_forms() {
        let p = MoleculeContext::Protein;
        assert_eq!(strip_coordinate_prefix("V600E", p), Some("V600E"));
        assert_eq!(strip_coordinate_prefix("p.V600E", p), Some("V600E"));
        assert_eq!(strip_coordinate_prefix("p.(V600E)", p), Some("V600E"));
        assert_eq!(strip_coordinate_prefix("(p.V600E)", p), Some("V600E"));
        assert_eq!(strip_coordinate_prefix("c.1799T>A", p), None);
    }

    #[test]
    fn test_strip_nucleotide_prefix_required() {
        assert_eq!(
            strip_coordinate_prefix("c.1799T>A", MoleculeContext::Cdna),
            Some("1799T>A")
        );
        assert_eq!(strip_coordinate_prefix("1799T>A", MoleculeContext::Cdna), None);
        assert_eq!(
            strip_coordinate_prefix("g.1799T>A", MoleculeContext::Cdna),
            None
        );
        assert_eq!(strip_coordinate_prefix("g.", MoleculeContext::Genomic), None);
    }

    #[test]
    fn test_protein_substitution_one_letter() {
        let payload = parse_change(MoleculeContext::Protein, "V600E").unwrap();
        assert_eq!(
            payload,
            TokenPayload::ProteinSubstitution(Substitution {
                pos: 600,
                ref_: "V".to_string(),
                alt: "E".to_string(),
            })
        );
    }

    #[test]
    fn test_protein_substitution_three_letter() {
        let payload = parse_change(MoleculeContext::Protein, "Val600Glu").unwrap();
        assert_eq!(payload.token_type(), TokenType::ProteinSubstitution);
        if let TokenPayload::ProteinSubstitution(s) = payload {
            assert_eq!(s.ref_, "V");
            assert_eq!(s.alt, "E");
        }
    }

    #[test]
    fn test_protein_mixed_convention_rejected() {
        assert!(parse_change(MoleculeContext::Protein, "Val600E").is_none());
    }

    #[test]
    fn test_protein_stop_gain() {
        for change in ["Tyr365Ter", "Y365*", "Tyr365*"] {
            let payload = parse_change(MoleculeContext::Protein, change).unwrap();
            assert_eq!(payload.token_type(), TokenType::ProteinStopGain, "{}", change);
        }
    }

    #[test]
    fn test_protein_delins_before_deletion() {
        let payload = parse_change(MoleculeContext::Protein, "Leu747_Pro753delinsSer").unwrap();
        match payload {
            TokenPayload::ProteinDelins(d) => {
                assert_eq!(d.span.aa0, "L");
                assert_eq!(d.span.pos1, Some(753));
                assert_eq!(d.inserted_sequence, "S");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_protein_reference_agree_and_insertion() {
        assert_eq!(
            parse_change(MoleculeContext::Protein, "Met1=").unwrap(),
            TokenPayload::ProteinReferenceAgree {
                pos: 1,
                ref_: "M".to_string()
            }
        );
        let ins = parse_change(MoleculeContext::Protein, "Lys23_Leu24insArgSerGln").unwrap();
        assert_eq!(ins.token_type(), TokenType::ProteinInsertion);
    }

    #[test]
    fn test_genomic_changes() {
        let cases = [
            ("140453136A>T", TokenType::GenomicSubstitution),
            ("140453136=", TokenType::GenomicReferenceAgree),
            ("10_12del", TokenType::GenomicDeletion),
            ("10_12delinsTT", TokenType::GenomicDelins),
            ("10_11insA", TokenType::GenomicInsertion),
            ("20189349dup", TokenType::GenomicDuplication),
            ("(?_63845873)_(63851771_?)dup", TokenType::GenomicDuplicationAmbiguous),
            ("(?_30417576)_31394018del", TokenType::GenomicDeletionAmbiguous),
        ];
        for (change, expected) in cases {
            let payload = parse_change(MoleculeContext::Genomic, change).unwrap();
            assert_eq!(payload.token_type(), expected, "{}", change);
        }
    }

    #[test]
    fn test_ambiguous_fully_unknown_side_rejected() {
        assert!(parse_change(MoleculeContext::Genomic, "(?_?)_(100_200)dup").is_none());
        assert!(parse_change(MoleculeContext::Genomic, "(100_200)_(?_?)del").is_none());
    }

    #[test]
    fn test_cdna_has_no_duplication() {
        assert!(parse_change(MoleculeContext::Cdna, "20dup").is_none());
    }

    #[test]
    fn test_matchers() {
        let protein = FreeTextMatcher::new(MoleculeContext::Protein);
        let token = protein.match_term("p.(V600E)").unwrap();
        assert_eq!(token.input, "p.(V600E)");
        assert_eq!(token.normalized, "V600E");

        assert!(AmplificationMatcher.match_term("Amplification").is_some());
        assert!(GeneSymbolMatcher.match_term("BRAF").is_some());
        assert!(GeneSymbolMatcher.match_term("c.1799T>A").is_none());
    }
}
