//! Amino acid code conversion
//!
//! Protein tokens are stored with one-letter codes. Input may use either the
//! one-letter or the three-letter convention, but every amino acid field of a
//! single token must use the same one.

/// Three-letter to one-letter code table (IUPAC, plus `Ter` for stop).
const AA3_TO_AA1: [(&str, char); 25] = [
    ("Ala", 'A'),
    ("Arg", 'R'),
    ("Asn", 'N'),
    ("Asp", 'D'),
    ("Asx", 'B'),
    ("Cys", 'C'),
    ("Gln", 'Q'),
    ("Glu", 'E'),
    ("Glx", 'Z'),
    ("Gly", 'G'),
    ("His", 'H'),
    ("Ile", 'I'),
    ("Leu", 'L'),
    ("Lys", 'K'),
    ("Met", 'M'),
    ("Phe", 'F'),
    ("Pro", 'P'),
    ("Pyl", 'O'),
    ("Sec", 'U'),
    ("Ser", 'S'),
    ("Thr", 'T'),
    ("Trp", 'W'),
    ("Tyr", 'Y'),
    ("Val", 'V'),
    ("Xaa", 'X'),
];

/// Which code convention a protein string was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AminoAcidConvention {
    OneLetter,
    ThreeLetter,
}

/// Is `c` a valid one-letter amino acid code (stop `*` included)?
pub fn is_aa1(c: char) -> bool {
    c == '*' || AA3_TO_AA1.iter().any(|(_, one)| *one == c)
}

/// Look up a single three-letter code. `Ter` maps to `*`.
pub fn aa3_to_aa1_code(code: &str) -> Option<char> {
    if code == "Ter" {
        return Some('*');
    }
    AA3_TO_AA1
        .iter()
        .find(|(three, _)| *three == code)
        .map(|(_, one)| *one)
}

/// Look up the three-letter code for a one-letter code.
pub fn aa1_to_aa3_code(code: char) -> Option<&'static str> {
    if code == '*' {
        return Some("Ter");
    }
    AA3_TO_AA1
        .iter()
        .find(|(_, one)| *one == code)
        .map(|(three, _)| *three)
}

/// Validate a string already written in one-letter codes.
fn parse_aa1(seq: &str) -> Option<String> {
    if !seq.is_empty() && seq.chars().all(is_aa1) {
        Some(seq.to_string())
    } else {
        None
    }
}

/// Convert a string of concatenated three-letter codes.
///
/// `*` is accepted as a stand-alone stop inside a three-letter string.
fn parse_aa3(seq: &str) -> Option<String> {
    if seq.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(seq.len() / 3 + 1);
    let mut rest = seq;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('*') {
            out.push('*');
            rest = stripped;
            continue;
        }
        let code = rest.get(..3)?;
        out.push(aa3_to_aa1_code(code)?);
        rest = &rest[3..];
    }
    Some(out)
}

/// Convert a single amino acid string (1 or 3 letter) to one-letter codes.
pub fn to_aa1(seq: &str) -> Option<String> {
    parse_aa1(seq).or_else(|| parse_aa3(seq))
}

/// Normalize a group of amino acid fields that must share a convention.
///
/// `None` entries are optional fields that were absent and stay absent.
/// Returns `None` if the group cannot be read under a single convention.
pub fn normalize_group(fields: &[Option<&str>]) -> Option<(AminoAcidConvention, Vec<Option<String>>)> {
    let attempt = |convert: fn(&str) -> Option<String>| -> Option<Vec<Option<String>>> {
        fields
            .iter()
            .map(|field| match field {
                Some(value) => convert(value).map(Some),
                None => Some(None),
            })
            .collect()
    };

    if let Some(converted) = attempt(parse_aa1) {
        return Some((AminoAcidConvention::OneLetter, converted));
    }
    attempt(parse_aa3).map(|converted| (AminoAcidConvention::ThreeLetter, converted))
}
