//! Regular grammars for change expressions
//!
//! Shared by the free-text matchers and by the HGVS change grammar in the
//! classifier. Nucleotide patterns apply to both cDNA and genomic contexts.

use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        pub static $name: Lazy<Regex> =
            Lazy::new(|| Regex::new($re).expect(concat!("invalid pattern ", stringify!($name))));
    };
}

// Nucleotide
pattern!(NUC_SUBSTITUTION, r"^(?P<pos>\d+)(?P<ref>[ACTGN])>(?P<alt>[ACTGN])$");
pattern!(NUC_REFERENCE_AGREE, r"^(?P<pos>\d+)=$");
pattern!(
    NUC_DELETION,
    r"^(?P<pos0>\d+)(_(?P<pos1>\d+))?del(?P<deleted_sequence>[ACTGN]+)?$"
);
pattern!(
    NUC_DELINS,
    r"^(?P<pos0>\d+)(_(?P<pos1>\d+))?delins(?P<inserted_sequence>[ACTGN]+)$"
);
pattern!(
    NUC_INSERTION,
    r"^(?P<pos0>\d+)_(?P<pos1>\d+)ins(?P<inserted_sequence>[ACTGN]+)$"
);
pattern!(GENOMIC_DUPLICATION, r"^(?P<pos0>\d+)(_(?P<pos1>\d+))?dup$");

// Ambiguous duplication/deletion. `kind` is `dup` or `del`.

// (#_#)_(#_#) or (?_#)_(#_?)
pattern!(
    AMBIGUOUS_BOTH_BRACKETED,
    r"^\((?P<pos0>\?|\d+)_(?P<pos1>\?|\d+)\)_\((?P<pos2>\?|\d+)_(?P<pos3>\?|\d+)\)(?P<kind>dup|del)$"
);
// (?_#)_#, (#_?)_# or (#_#)_#
pattern!(
    AMBIGUOUS_START_BRACKETED,
    r"^\((?P<pos0>\?|\d+)_(?P<pos1>\?|\d+)\)_(?P<pos2>\d+)(?P<kind>dup|del)$"
);
// #_(#_?) or #_(#_#)
pattern!(
    AMBIGUOUS_END_BRACKETED,
    r"^(?P<pos0>\d+)_\((?P<pos2>\?|\d+)_(?P<pos3>\?|\d+)\)(?P<kind>dup|del)$"
);

// Protein. Amino acid fields are validated separately for a consistent code convention.
pattern!(
    PROTEIN_SUBSTITUTION,
    r"^(?P<ref>[a-zA-Z]+)(?P<pos>\d+)(?P<alt>([a-zA-Z]|Ter|\*)+)$"
);
pattern!(PROTEIN_REFERENCE_AGREE, r"^(?P<ref>[a-zA-Z]+)(?P<pos>\d+)=$");
pattern!(
    PROTEIN_DELETION,
    r"^(?P<aa0>[a-zA-Z]+)(?P<pos0>\d+)(_(?P<aa1>[a-zA-Z]+)(?P<pos1>\d+))?del(?P<deleted_sequence>[a-zA-Z]+)?$"
);
pattern!(
    PROTEIN_DELINS,
    r"^(?P<aa0>[a-zA-Z]+)(?P<pos0>\d+)(_(?P<aa1>[a-zA-Z]+)(?P<pos1>\d+))?delins(?P<inserted_sequence>[a-zA-Z]+)$"
);
pattern!(
    PROTEIN_INSERTION,
    r"^(?P<aa0>[a-zA-Z]+)(?P<pos0>\d+)_(?P<aa1>[a-zA-Z]+)(?P<pos1>\d+)ins(?P<inserted_sequence>[a-zA-Z]+)$"
);

// Whole-term grammars
pattern!(
    HGVS,
    r"^(?P<accession>(NC_|NM_|NP_|ENSP|ENST)[^:\s]+):(?P<coordinate>[cgnpr])\.(?P<change>\S+)$"
);
pattern!(
    GNOMAD_VCF,
    r"^(?i)(?P<chromosome>(chr)?([1-9]|1[0-9]|2[0-2]|X|Y))-(?P<pos>[1-9]\d*)-(?P<ref>[ACTG]+)-(?P<alt>[ACTG]+)$"
);
pattern!(AMPLIFICATION, r"^(?i)amplification$");
pattern!(GENE_SYMBOL, r"^[A-Za-z0-9][A-Za-z0-9@._-]*$");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nucleotide_patterns() {
        assert!(NUC_SUBSTITUTION.is_match("1799T>A"));
        assert!(!NUC_SUBSTITUTION.is_match("1799TT>A"));
        assert!(NUC_DELETION.is_match("10_12delACT"));
        assert!(NUC_DELETION.is_match("10del"));
        assert!(NUC_DELINS.is_match("10_12delinsG"));
        assert!(!NUC_DELETION.is_match("10_12delinsG"));
        assert!(NUC_INSERTION.is_match("10_11insA"));
        assert!(GENOMIC_DUPLICATION.is_match("20189349dup"));
    }

    #[test]
    fn test_ambiguous_patterns() {
        let caps = AMBIGUOUS_BOTH_BRACKETED
            .captures("(?_63845873)_(63851771_?)dup")
            .unwrap();
        assert_eq!(&caps["pos0"], "?");
        assert_eq!(&caps["pos1"], "63845873");
        assert_eq!(&caps["kind"], "dup");
        assert!(AMBIGUOUS_START_BRACKETED.is_match("(?_30417576)_31394018del"));
        assert!(AMBIGUOUS_END_BRACKETED.is_match("31060227_(31100351_?)dup"));
    }

    #[test]
    fn test_hgvs_pattern() {
        let caps = HGVS.captures("NC_000007.13:g.140453136A>T").unwrap();
        assert_eq!(&caps["accession"], "NC_000007.13");
        assert_eq!(&caps["coordinate"], "g");
        assert_eq!(&caps["change"], "140453136A>T");
        assert!(!HGVS.is_match("XM_1:c.1A>T"));
    }

    #[test]
    fn test_gnomad_pattern_case_insensitive() {
        assert!(GNOMAD_VCF.is_match("7-140453136-A-T"));
        assert!(GNOMAD_VCF.is_match("chr7-140453136-a-t"));
        assert!(!GNOMAD_VCF.is_match("chr23-1-A-T"));
        assert!(!GNOMAD_VCF.is_match("7-0-A-T"));
    }
}
