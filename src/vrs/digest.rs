//! GA4GH computed identifiers
//!
//! An object's digest is `sha512t24u` over its canonical JSON: keys sorted,
//! no whitespace, `id`/`digest`/`label` and the location's `sequence`
//! excluded, and identifiable children replaced by their own digest.

use serde_json::{json, Value};
use sha2::{Digest, Sha512};

use super::models::{
    Allele, Coordinate, CopyNumberChange, CopyNumberCount, SequenceLocation, Variation,
};

/// SHA-512 truncated to 24 bytes, base64url-encoded
pub fn sha512t24u(data: impl AsRef<[u8]>) -> String {
    let hash = Sha512::digest(data.as_ref());
    base64_url::encode(&hash[..24])
}

/// Refget identifier for a raw sequence, `ga4gh:SQ.<digest>`
pub fn sequence_identifier(sequence: &str) -> String {
    format!("ga4gh:SQ.{}", sha512t24u(sequence.to_ascii_uppercase()))
}

/// Serialize a JSON value canonically: sorted keys, compact separators
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars already print compactly.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn coordinate_value(coordinate: &Coordinate) -> Value {
    match coordinate {
        Coordinate::Number(n) => json!(n),
        Coordinate::Range([lo, hi]) => json!([lo, hi]),
    }
}

pub fn sequence_location_digest(location: &SequenceLocation) -> String {
    let value = json!({
        "end": coordinate_value(&location.end),
        "sequenceReference": {
            "refgetAccession": location.sequence_reference.refget_accession,
            "type": "SequenceReference"
        },
        "start": coordinate_value(&location.start),
        "type": "SequenceLocation"
    });
    sha512t24u(canonical_json(&value))
}

pub fn allele_digest(allele: &Allele) -> String {
    let value = json!({
        "location": sequence_location_digest(&allele.location),
        "state": {
            "sequence": allele.state.sequence,
            "type": "LiteralSequenceExpression"
        },
        "type": "Allele"
    });
    sha512t24u(canonical_json(&value))
}

pub fn copy_number_count_digest(cn: &CopyNumberCount) -> String {
    let value = json!({
        "copies": coordinate_value(&cn.copies),
        "location": sequence_location_digest(&cn.location),
        "type": "CopyNumberCount"
    });
    sha512t24u(canonical_json(&value))
}

pub fn copy_number_change_digest(cx: &CopyNumberChange) -> String {
    let value = json!({
        "copyChange": cx.copy_change.code(),
        "location": sequence_location_digest(&cx.location),
        "type": "CopyNumberChange"
    });
    sha512t24u(canonical_json(&value))
}

fn identify_location(location: &mut SequenceLocation) {
    let digest = sequence_location_digest(location);
    location.id = Some(format!("ga4gh:SL.{}", digest));
    location.digest = Some(digest);
}

/// Assign `id` and `digest` to a variation and its location.
///
/// Must run after normalization; any later change to location or state
/// invalidates the identifiers.
pub fn identify(variation: &mut Variation) {
    match variation {
        Variation::Allele(allele) => {
            identify_location(&mut allele.location);
            let digest = allele_digest(allele);
            allele.id = Some(format!("ga4gh:VA.{}", digest));
            allele.digest = Some(digest);
        }
        Variation::CopyNumberCount(cn) => {
            identify_location(&mut cn.location);
            let digest = copy_number_count_digest(cn);
            cn.id = Some(format!("ga4gh:CN.{}", digest));
            cn.digest = Some(digest);
        }
        Variation::CopyNumberChange(cx) => {
            identify_location(&mut cx.location);
            let digest = copy_number_change_digest(cx);
            cx.id = Some(format!("ga4gh:CX.{}", digest));
            cx.digest = Some(digest);
        }
    }
}
