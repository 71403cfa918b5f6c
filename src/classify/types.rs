//! Classification model

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reference::AnnotationLayer;
use crate::token::{
    AltType, AmbiguousRange, Deletion, Delins, Duplication, GnomadVcfToken, Insertion,
    ProteinDeletion, ProteinDelins, ProteinInsertion, Substitution, Token, TokenPayload,
};

/// The twenty classification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationType {
    ProteinSubstitution,
    ProteinStopGain,
    ProteinReferenceAgree,
    ProteinDelins,
    ProteinDeletion,
    ProteinInsertion,
    CdnaSubstitution,
    CdnaReferenceAgree,
    CdnaDelins,
    CdnaDeletion,
    CdnaInsertion,
    GenomicSubstitution,
    GenomicReferenceAgree,
    GenomicDelins,
    GenomicDeletion,
    GenomicInsertion,
    GenomicDuplication,
    GenomicDuplicationAmbiguous,
    GenomicDeletionAmbiguous,
    Amplification,
}

impl ClassificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationType::ProteinSubstitution => "protein_substitution",
            ClassificationType::ProteinStopGain => "protein_stop_gain",
            ClassificationType::ProteinReferenceAgree => "protein_reference_agree",
            ClassificationType::ProteinDelins => "protein_delins",
            ClassificationType::ProteinDeletion => "protein_deletion",
            ClassificationType::ProteinInsertion => "protein_insertion",
            ClassificationType::CdnaSubstitution => "cdna_substitution",
            ClassificationType::CdnaReferenceAgree => "cdna_reference_agree",
            ClassificationType::CdnaDelins => "cdna_delins",
            ClassificationType::CdnaDeletion => "cdna_deletion",
            ClassificationType::CdnaInsertion => "cdna_insertion",
            ClassificationType::GenomicSubstitution => "genomic_substitution",
            ClassificationType::GenomicReferenceAgree => "genomic_reference_agree",
            ClassificationType::GenomicDelins => "genomic_delins",
            ClassificationType::GenomicDeletion => "genomic_deletion",
            ClassificationType::GenomicInsertion => "genomic_insertion",
            ClassificationType::GenomicDuplication => "genomic_duplication",
            ClassificationType::GenomicDuplicationAmbiguous => "genomic_duplication_ambiguous",
            ClassificationType::GenomicDeletionAmbiguous => "genomic_deletion_ambiguous",
            ClassificationType::Amplification => "amplification",
        }
    }
}

impl fmt::Display for ClassificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the query was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nomenclature {
    FreeText,
    Hgvs,
    GnomadVcf,
}

/// Sequence Ontology terms attached to substitution-like classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceOntology {
    #[serde(rename = "SO:0001483")]
    Snv,
    #[serde(rename = "SO:0002007")]
    Mnv,
    #[serde(rename = "SO:0002073")]
    NoSequenceAlteration,
}

impl SequenceOntology {
    pub fn id(&self) -> &'static str {
        match self {
            SequenceOntology::Snv => "SO:0001483",
            SequenceOntology::Mnv => "SO:0002007",
            SequenceOntology::NoSequenceAlteration => "SO:0002073",
        }
    }

    /// SNV for single-base, MNV for equal-length multi-base changes
    pub fn for_substitution(ref_: &str, alt: &str) -> Option<Self> {
        match (ref_.len(), alt.len()) {
            (1, 1) => Some(SequenceOntology::Snv),
            (r, a) if r == a && r > 1 => Some(SequenceOntology::Mnv),
            _ => None,
        }
    }
}

/// Nucleotide substitution with its sequence-ontology subtype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NucleotideSubstitution {
    pub pos: u64,
    #[serde(rename = "ref")]
    pub ref_: String,
    pub alt: String,
    pub so_id: SequenceOntology,
}

/// Bracket-position pattern of an ambiguous range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbiguousType {
    /// `(#_#)_(#_#)`
    #[serde(rename = "(#_#)_(#_#)")]
    Ambiguous1,
    /// `(?_#)_(#_?)`
    #[serde(rename = "(?_#)_(#_?)")]
    Ambiguous2,
    /// `(#_?)_(?_#)`
    #[serde(rename = "(#_?)_(?_#)")]
    Ambiguous3,
    /// `(#_#)_#`
    #[serde(rename = "(#_#)_#")]
    Ambiguous4,
    /// `(?_#)_#`
    #[serde(rename = "(?_#)_#")]
    Ambiguous5,
    /// `#_(#_#)`
    #[serde(rename = "#_(#_#)")]
    Ambiguous6,
    /// `#_(#_?)`
    #[serde(rename = "#_(#_?)")]
    Ambiguous7,
}

impl AmbiguousType {
    pub fn shape(&self) -> &'static str {
        match self {
            AmbiguousType::Ambiguous1 => "(#_#)_(#_#)",
            AmbiguousType::Ambiguous2 => "(?_#)_(#_?)",
            AmbiguousType::Ambiguous3 => "(#_?)_(?_#)",
            AmbiguousType::Ambiguous4 => "(#_#)_#",
            AmbiguousType::Ambiguous5 => "(?_#)_#",
            AmbiguousType::Ambiguous6 => "#_(#_#)",
            AmbiguousType::Ambiguous7 => "#_(#_?)",
        }
    }
}

impl fmt::Display for AmbiguousType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape())
    }
}

/// Outcome of ambiguous-range resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AmbiguousResolution {
    Supported { ambiguous_type: AmbiguousType },
    /// Recognized lexically but not translatable. `shape` is set when the
    /// positions form one of the named patterns.
    Unsupported { shape: Option<AmbiguousType> },
}

impl AmbiguousResolution {
    pub fn supported(&self) -> Option<AmbiguousType> {
        match self {
            AmbiguousResolution::Supported { ambiguous_type } => Some(*ambiguous_type),
            AmbiguousResolution::Unsupported { .. } => None,
        }
    }
}

/// Ambiguous duplication/deletion with its resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousVariant {
    #[serde(flatten)]
    pub range: AmbiguousRange,
    pub resolution: AmbiguousResolution,
}

/// Variant payload of a classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "classification_type", rename_all = "snake_case")]
pub enum ClassifiedVariant {
    ProteinSubstitution(Substitution),
    ProteinStopGain(Substitution),
    ProteinReferenceAgree {
        pos: u64,
        #[serde(rename = "ref")]
        ref_: String,
    },
    ProteinDelins(ProteinDelins),
    ProteinDeletion(ProteinDeletion),
    ProteinInsertion(ProteinInsertion),
    CdnaSubstitution(NucleotideSubstitution),
    CdnaReferenceAgree { pos: u64 },
    CdnaDelins(Delins),
    CdnaDeletion(Deletion),
    CdnaInsertion(Insertion),
    GenomicSubstitution(NucleotideSubstitution),
    GenomicReferenceAgree { pos: u64 },
    GenomicDelins(Delins),
    GenomicDeletion(Deletion),
    GenomicInsertion(Insertion),
    GenomicDuplication(Duplication),
    GenomicDuplicationAmbiguous(AmbiguousVariant),
    GenomicDeletionAmbiguous(AmbiguousVariant),
    Amplification,
}

impl ClassifiedVariant {
    pub fn classification_type(&self) -> ClassificationType {
        match self {
            ClassifiedVariant::ProteinSubstitution(_) => ClassificationType::ProteinSubstitution,
            ClassifiedVariant::ProteinStopGain(_) => ClassificationType::ProteinStopGain,
            ClassifiedVariant::ProteinReferenceAgree { .. } => {
                ClassificationType::ProteinReferenceAgree
            }
            ClassifiedVariant::ProteinDelins(_) => ClassificationType::ProteinDelins,
            ClassifiedVariant::ProteinDeletion(_) => ClassificationType::ProteinDeletion,
            ClassifiedVariant::ProteinInsertion(_) => ClassificationType::ProteinInsertion,
            ClassifiedVariant::CdnaSubstitution(_) => ClassificationType::CdnaSubstitution,
            ClassifiedVariant::CdnaReferenceAgree { .. } => ClassificationType::CdnaReferenceAgree,
            ClassifiedVariant::CdnaDelins(_) => ClassificationType::CdnaDelins,
            ClassifiedVariant::CdnaDeletion(_) => ClassificationType::CdnaDeletion,
            ClassifiedVariant::CdnaInsertion(_) => ClassificationType::CdnaInsertion,
            ClassifiedVariant::GenomicSubstitution(_) => ClassificationType::GenomicSubstitution,
            ClassifiedVariant::GenomicReferenceAgree { .. } => {
                ClassificationType::GenomicReferenceAgree
            }
            ClassifiedVariant::GenomicDelins(_) => ClassificationType::GenomicDelins,
            ClassifiedVariant::GenomicDeletion(_) => ClassificationType::GenomicDeletion,
            ClassifiedVariant::GenomicInsertion(_) => ClassificationType::GenomicInsertion,
            ClassifiedVariant::GenomicDuplication(_) => ClassificationType::GenomicDuplication,
            ClassifiedVariant::GenomicDuplicationAmbiguous(_) => {
                ClassificationType::GenomicDuplicationAmbiguous
            }
            ClassifiedVariant::GenomicDeletionAmbiguous(_) => {
                ClassificationType::GenomicDeletionAmbiguous
            }
            ClassifiedVariant::Amplification => ClassificationType::Amplification,
        }
    }

    pub fn layer(&self) -> AnnotationLayer {
        use ClassifiedVariant::*;
        match self {
            ProteinSubstitution(_) | ProteinStopGain(_) | ProteinReferenceAgree { .. }
            | ProteinDelins(_) | ProteinDeletion(_) | ProteinInsertion(_) => AnnotationLayer::Protein,
            CdnaSubstitution(_) | CdnaReferenceAgree { .. } | CdnaDelins(_) | CdnaDeletion(_)
            | CdnaInsertion(_) => AnnotationLayer::Cdna,
            _ => AnnotationLayer::Genomic,
        }
    }

    /// Alteration type used by the translator
    pub fn alt_type(&self) -> AltType {
        use ClassifiedVariant::*;
        match self {
            ProteinSubstitution(_) | CdnaSubstitution(_) | GenomicSubstitution(_) => {
                AltType::Substitution
            }
            ProteinStopGain(_) => AltType::StopGain,
            ProteinReferenceAgree { .. } | CdnaReferenceAgree { .. } | GenomicReferenceAgree { .. } => {
                AltType::ReferenceAgree
            }
            ProteinDelins(_) | CdnaDelins(_) | GenomicDelins(_) => AltType::Delins,
            ProteinDeletion(_) | CdnaDeletion(_) | GenomicDeletion(_) => AltType::Deletion,
            ProteinInsertion(_) | CdnaInsertion(_) | GenomicInsertion(_) => AltType::Insertion,
            GenomicDuplication(_) => AltType::Duplication,
            GenomicDuplicationAmbiguous(_) => AltType::DuplicationAmbiguous,
            GenomicDeletionAmbiguous(_) => AltType::DeletionAmbiguous,
            Amplification => AltType::Amplification,
        }
    }

    /// Known positions that must be listed 5' to 3', in declaration order.
    ///
    /// Empty for single-position variants.
    pub fn ordered_positions(&self) -> Vec<u64> {
        use ClassifiedVariant::*;
        match self {
            ProteinDelins(d) => pair(d.span.pos0, d.span.pos1),
            ProteinDeletion(d) => pair(d.span.pos0, d.span.pos1),
            ProteinInsertion(i) => vec![i.pos0, i.pos1],
            CdnaDelins(d) | GenomicDelins(d) => pair(d.pos0, d.pos1),
            CdnaDeletion(d) | GenomicDeletion(d) => pair(d.pos0, d.pos1),
            CdnaInsertion(i) | GenomicInsertion(i) => vec![i.pos0, i.pos1],
            GenomicDuplication(d) => pair(d.pos0, d.pos1),
            GenomicDuplicationAmbiguous(a) | GenomicDeletionAmbiguous(a) => {
                let r = &a.range;
                [Some(r.pos0), r.pos1, Some(r.pos2), r.pos3]
                    .into_iter()
                    .flatten()
                    .filter_map(|p| p.value())
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Ambiguous payload, if any
    pub fn ambiguous(&self) -> Option<&AmbiguousVariant> {
        match self {
            ClassifiedVariant::GenomicDuplicationAmbiguous(a)
            | ClassifiedVariant::GenomicDeletionAmbiguous(a) => Some(a),
            _ => None,
        }
    }
}

fn pair(pos0: u64, pos1: Option<u64>) -> Vec<u64> {
    match pos1 {
        Some(p1) => vec![pos0, p1],
        None => Vec::new(),
    }
}

/// Result of classifying one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub matching_tokens: Vec<Token>,
    pub nomenclature: Nomenclature,
    /// Canonical gene symbol for free-text queries
    pub gene: Option<String>,
    /// Accession embedded in an HGVS query
    pub accession: Option<String>,
    #[serde(flatten)]
    pub variant: ClassifiedVariant,
}

impl Classification {
    pub fn classification_type(&self) -> ClassificationType {
        self.variant.classification_type()
    }

    /// The gnomAD VCF token a gnomAD classification was derived from
    pub fn gnomad_vcf(&self) -> Option<&GnomadVcfToken> {
        self.matching_tokens.iter().find_map(|t| match &t.payload {
            TokenPayload::GnomadVcf(g) => Some(g),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{AmbiguousPos, AmbiguousShape};

    #[test]
    fn test_sequence_ontology_subtype() {
        assert_eq!(SequenceOntology::for_substitution("A", "T"), Some(SequenceOntology::Snv));
        assert_eq!(SequenceOntology::for_substitution("AC", "TG"), Some(SequenceOntology::Mnv));
        assert_eq!(SequenceOntology::for_substitution("A", "TG"), None);
        assert_eq!(SequenceOntology::Snv.id(), "SO:0001483");
    }

    #[test]
    fn test_ambiguous_type_shapes() {
        assert_eq!(AmbiguousType::Ambiguous2.to_string(), "(?_#)_(#_?)");
        assert_eq!(AmbiguousType::Ambiguous7.shape(), "#_(#_?)");
    }

    #[test]
    fn test_ordered_positions() {
        let del = ClassifiedVariant::GenomicDeletion(Deletion {
            pos0: 10,
            pos1: Some(12),
            deleted_sequence: None,
        });
        assert_eq!(del.ordered_positions(), vec![10, 12]);

        let single = ClassifiedVariant::GenomicDuplication(Duplication { pos0: 5, pos1: None });
        assert!(single.ordered_positions().is_empty());

        let amb = ClassifiedVariant::GenomicDuplicationAmbiguous(AmbiguousVariant {
            range: AmbiguousRange {
                pos0: AmbiguousPos::Unknown,
                pos1: Some(AmbiguousPos::Pos(100)),
                pos2: AmbiguousPos::Pos(200),
                pos3: Some(AmbiguousPos::Unknown),
                shape: AmbiguousShape::BothBracketed,
            },
            resolution: AmbiguousResolution::Supported {
                ambiguous_type: AmbiguousType::Ambiguous2,
            },
        });
        assert_eq!(amb.ordered_positions(), vec![100, 200]);
        assert_eq!(amb.alt_type(), AltType::DuplicationAmbiguous);
        assert_eq!(amb.layer(), AnnotationLayer::Genomic);
    }

    #[test]
    fn test_classification_type_names() {
        assert_eq!(
            ClassificationType::GenomicDeletionAmbiguous.to_string(),
            "genomic_deletion_ambiguous"
        );
    }
}
