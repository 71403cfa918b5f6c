//! Whole-term matchers: HGVS expressions and gnomAD VCF strings

use crate::token::{CoordinateType, GnomadVcfToken, HgvsToken, Token, TokenPayload};
use crate::tokenize::patterns;
use crate::tokenize::Matcher;

/// Matches `accession:coordinate.change`
///
/// The change part is kept verbatim; the classifier applies the change
/// grammar for the coordinate type.
pub struct HgvsMatcher;

impl Matcher for HgvsMatcher {
    fn name(&self) -> &'static str {
        "hgvs"
    }

    fn match_term(&self, term: &str) -> Option<Token> {
        let caps = patterns::HGVS.captures(term)?;
        let coordinate_type = caps
            .name("coordinate")
            .and_then(|m| m.as_str().chars().next())
            .and_then(CoordinateType::from_prefix)?;

        Some(Token::new(
            term,
            term,
            TokenPayload::Hgvs(HgvsToken {
                accession: caps.name("accession")?.as_str().to_string(),
                coordinate_type,
                change: caps.name("change")?.as_str().to_string(),
            }),
        ))
    }
}

/// Matches gnomAD-style `chr-pos-ref-alt`
pub struct GnomadVcfMatcher;

impl Matcher for GnomadVcfMatcher {
    fn name(&self) -> &'static str {
        "gnomad_vcf"
    }

    fn match_term(&self, term: &str) -> Option<Token> {
        let caps = patterns::GNOMAD_VCF.captures(term)?;
        let raw_chrom = caps.name("chromosome")?.as_str();
        let suffix = if raw_chrom.len() > 3 && raw_chrom[..3].eq_ignore_ascii_case("chr") {
            &raw_chrom[3..]
        } else {
            raw_chrom
        };
        let chromosome = format!("chr{}", suffix.to_ascii_uppercase());
        let pos = caps.name("pos")?.as_str().parse().ok()?;
        let ref_ = caps.name("ref")?.as_str().to_ascii_uppercase();
        let alt = caps.name("alt")?.as_str().to_ascii_uppercase();
        let normalized = format!("{}-{}-{}-{}", chromosome, pos, ref_, alt);

        Some(Token::new(
            term,
            normalized,
            TokenPayload::GnomadVcf(GnomadVcfToken {
                chromosome,
                pos,
                ref_,
                alt,
            }),
        ))
    }
}
