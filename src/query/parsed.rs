//! Copy number variations from parsed genomic coordinates
//!
//! Requests name a sequence either by `accession` or by `assembly` plus
//! `chromosome`. Positions are 1-based residues; each end of the location
//! is a number, a definite range or a half-open range.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::QueryContext;
use crate::error::FerroError;
use crate::reference::{Assembly, ResidueMode};
use crate::vrs::{
    identify, Coordinate, CopyChange, CopyNumberChange, CopyNumberCount, SequenceLocation,
    Variation,
};

static CHROMOSOME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^chr(X|Y|([1-9]|1[0-9]|2[0-2]))$").expect("valid chromosome pattern")
});

/// Shape of a location bound or of a copy count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsedPosType {
    #[default]
    Number,
    DefiniteRange,
    IndefiniteRange,
}

/// Open side of an indefinite range: `<=` is `(?_#)`-style upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<=")]
    LtOrEqual,
    #[serde(rename = ">=")]
    GtOrEqual,
}

/// Assembly names as they appear in ClinVar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedAssembly {
    #[serde(rename = "GRCh38")]
    Grch38,
    #[serde(rename = "GRCh37")]
    Grch37,
    #[serde(rename = "NCBI36")]
    Ncbi36,
    #[serde(rename = "hg38")]
    Hg38,
    #[serde(rename = "hg19")]
    Hg19,
    #[serde(rename = "hg18")]
    Hg18,
}

impl ParsedAssembly {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParsedAssembly::Grch38 => "GRCh38",
            ParsedAssembly::Grch37 => "GRCh37",
            ParsedAssembly::Ncbi36 => "NCBI36",
            ParsedAssembly::Hg38 => "hg38",
            ParsedAssembly::Hg19 => "hg19",
            ParsedAssembly::Hg18 => "hg18",
        }
    }
}

/// Location fields shared by both parsed endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLocation {
    #[serde(default)]
    pub assembly: Option<ParsedAssembly>,
    /// `chr`-prefixed, e.g. `chr7`
    #[serde(default)]
    pub chromosome: Option<String>,
    /// Genomic RefSeq accession; takes precedence over assembly/chromosome
    #[serde(default)]
    pub accession: Option<String>,
    pub start0: u64,
    pub end0: u64,
    #[serde(default)]
    pub start_pos_comparator: Option<Comparator>,
    #[serde(default)]
    pub end_pos_comparator: Option<Comparator>,
    #[serde(default)]
    pub start_pos_type: ParsedPosType,
    #[serde(default)]
    pub end_pos_type: ParsedPosType,
    #[serde(default)]
    pub start1: Option<u64>,
    #[serde(default)]
    pub end1: Option<u64>,
    #[serde(default)]
    pub do_liftover: bool,
}

impl ParsedLocation {
    /// Number-typed location on an assembly and chromosome
    pub fn on_chromosome(assembly: ParsedAssembly, chromosome: &str, start0: u64, end0: u64) -> Self {
        Self {
            assembly: Some(assembly),
            chromosome: Some(chromosome.to_string()),
            accession: None,
            start0,
            end0,
            start_pos_comparator: None,
            end_pos_comparator: None,
            start_pos_type: ParsedPosType::Number,
            end_pos_type: ParsedPosType::Number,
            start1: None,
            end1: None,
            do_liftover: false,
        }
    }

    /// Check field combinations; the error is a user-facing message
    pub fn validate(&self) -> Result<(), String> {
        let assembly_chromosome = self.assembly.is_some() && self.chromosome.is_some();
        if self.accession.is_none() && !assembly_chromosome {
            return Err(
                "Must provide either `accession` or both `assembly` and `chromosome`".to_string(),
            );
        }
        if let (true, Some(chromosome)) = (assembly_chromosome, &self.chromosome) {
            if !CHROMOSOME.is_match(chromosome) {
                return Err(format!(
                    "`chromosome`, {}, does not match r'{}'",
                    chromosome,
                    CHROMOSOME.as_str()
                ));
            }
        }

        check_bound(
            "start",
            self.start0,
            self.start1,
            self.start_pos_type,
            self.start_pos_comparator,
        )?;
        check_bound(
            "end",
            self.end0,
            self.end1,
            self.end_pos_type,
            self.end_pos_comparator,
        )?;

        let last_start = self.start1.unwrap_or(self.start0);
        if self.end0 <= last_start {
            return Err("end positions must be greater than start".to_string());
        }
        Ok(())
    }
}

fn check_bound(
    name: &str,
    pos0: u64,
    pos1: Option<u64>,
    pos_type: ParsedPosType,
    comparator: Option<Comparator>,
) -> Result<(), String> {
    match pos_type {
        ParsedPosType::DefiniteRange => match pos1 {
            None => Err(format!("`{}1` is required for definite ranges", name)),
            Some(p1) if p1 <= pos0 => Err(format!("`{0}0` must be less than `{0}1`", name)),
            Some(_) => Ok(()),
        },
        ParsedPosType::IndefiniteRange if comparator.is_none() => Err(format!(
            "`{}_pos_comparator` is required for indefinite ranges",
            name
        )),
        _ => Ok(()),
    }
}

/// Request body for a copy number count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToCnVarQuery {
    #[serde(flatten)]
    pub location: ParsedLocation,
    pub copies0: u64,
    #[serde(default)]
    pub copies1: Option<u64>,
    #[serde(default)]
    pub copies_type: ParsedPosType,
    #[serde(default)]
    pub copies_comparator: Option<Comparator>,
}

impl ParsedToCnVarQuery {
    pub fn validate(&self) -> Result<(), String> {
        self.location.validate()?;
        match self.copies_type {
            ParsedPosType::DefiniteRange if self.copies1.is_none() => Err(
                "`copies1` must be provided for `copies_type` definite_range".to_string(),
            ),
            ParsedPosType::IndefiniteRange if self.copies_comparator.is_none() => Err(
                "`copies_comparator` must be provided for `copies_type` indefinite_range"
                    .to_string(),
            ),
            _ => Ok(()),
        }
    }

    fn copies(&self) -> Coordinate {
        match (self.copies_type, self.copies_comparator) {
            (ParsedPosType::Number, _) => Coordinate::Number(self.copies0),
            (ParsedPosType::DefiniteRange, _) => {
                Coordinate::Range([Some(self.copies0), self.copies1])
            }
            (ParsedPosType::IndefiniteRange, Some(Comparator::LtOrEqual)) => {
                Coordinate::Range([None, Some(self.copies0)])
            }
            (ParsedPosType::IndefiniteRange, _) => Coordinate::Range([Some(self.copies0), None]),
        }
    }
}

/// Request body for a copy number change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToCxVarQuery {
    #[serde(flatten)]
    pub location: ParsedLocation,
    pub copy_change: CopyChange,
}

impl ParsedToCxVarQuery {
    pub fn validate(&self) -> Result<(), String> {
        self.location.validate()
    }
}

/// Sequence a parsed request resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedSequence {
    /// `ga4gh:SQ.` identifier
    refget: String,
    /// `chr`-prefixed chromosome, used for liftover
    chromosome: String,
    /// Whether positions still need lifting to GRCh38
    lift: bool,
}

/// Builds copy number variations from [`ParsedLocation`]s
pub struct ParsedCopyNumber<'a> {
    ctx: &'a QueryContext,
}

impl<'a> ParsedCopyNumber<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    pub async fn copy_number_count(
        &self,
        query: &ParsedToCnVarQuery,
    ) -> Result<CopyNumberCount, FerroError> {
        let location = self.location(&query.location).await?;
        let mut variation = Variation::CopyNumberCount(CopyNumberCount {
            id: None,
            digest: None,
            location,
            copies: query.copies(),
        });
        identify(&mut variation);
        match variation {
            Variation::CopyNumberCount(cn) => Ok(cn),
            other => Err(FerroError::ConversionError {
                msg: format!("expected CopyNumberCount, built {}", other.type_name()),
            }),
        }
    }

    pub async fn copy_number_change(
        &self,
        query: &ParsedToCxVarQuery,
    ) -> Result<CopyNumberChange, FerroError> {
        let location = self.location(&query.location).await?;
        let mut variation = Variation::CopyNumberChange(CopyNumberChange {
            id: None,
            digest: None,
            label: None,
            location,
            copy_change: query.copy_change,
        });
        identify(&mut variation);
        match variation {
            Variation::CopyNumberChange(cx) => Ok(cx),
            other => Err(FerroError::ConversionError {
                msg: format!("expected CopyNumberChange, built {}", other.type_name()),
            }),
        }
    }

    async fn location(&self, parsed: &ParsedLocation) -> Result<SequenceLocation, FerroError> {
        let resolved = match (&parsed.accession, parsed.assembly, &parsed.chromosome) {
            (Some(accession), _, _) => self.from_accession(accession, parsed.do_liftover).await?,
            (None, Some(assembly), Some(chromosome)) => {
                self.from_chromosome(assembly, chromosome, parsed.do_liftover)
                    .await?
            }
            _ => {
                return Err(FerroError::resolution(
                    "Must provide either `accession` or both `assembly` and `chromosome`",
                ))
            }
        };

        let mut positions = [
            Some(parsed.start0),
            Some(parsed.end0),
            parsed.start1,
            parsed.end1,
        ];
        if resolved.lift {
            for pos in positions.iter_mut() {
                if let Some(p) = *pos {
                    *pos = Some(self.lift(&resolved.chromosome, p).await?);
                }
            }
        }
        let [Some(start0), Some(end0), start1, end1] = positions else {
            return Err(FerroError::resolution("start0 and end0 are required"));
        };

        for pos in [start0, end0] {
            self.check_position(&resolved.refget, pos).await?;
        }
        let start = self
            .bound(&resolved.refget, start0, start1, parsed.start_pos_type, parsed.start_pos_comparator, true)
            .await?;
        let end = self
            .bound(&resolved.refget, end0, end1, parsed.end_pos_type, parsed.end_pos_comparator, false)
            .await?;
        Ok(SequenceLocation::new(&resolved.refget, start, end))
    }

    async fn from_chromosome(
        &self,
        assembly: ParsedAssembly,
        chromosome: &str,
        use_grch38: bool,
    ) -> Result<ResolvedSequence, FerroError> {
        let assembly = Assembly::parse(assembly.as_str())?;
        let lift = use_grch38 && assembly != Assembly::GRCh38;
        let target = if lift { Assembly::GRCh38 } else { assembly };

        let query = format!("{}:{}", target, chromosome);
        let refget = self.ctx.refget_accession(&query).await.map_err(|e| {
            tracing::debug!(query = %query, error = %e, "no sequence for chromosome");
            FerroError::resolution(format!("Unable to find sequence for: {}", query))
        })?;
        Ok(ResolvedSequence {
            refget,
            chromosome: chromosome.to_string(),
            lift,
        })
    }

    async fn from_accession(
        &self,
        accession: &str,
        do_liftover: bool,
    ) -> Result<ResolvedSequence, FerroError> {
        let aliases = self.ctx.translate_identifier(accession, None).await?;
        let placed = aliases
            .iter()
            .find(|a| a.starts_with("GRCh38:chr") || a.starts_with("GRCh37:chr"))
            .ok_or_else(|| {
                FerroError::resolution(format!("Not a supported genomic accession: {}", accession))
            })?;
        let (assembly, chromosome) = placed
            .split_once(':')
            .ok_or_else(|| FerroError::resolution(format!("Malformed alias: {}", placed)))?;

        if assembly == "GRCh38" || !do_liftover {
            let refget = aliases
                .iter()
                .find(|a| a.starts_with("ga4gh:"))
                .cloned()
                .ok_or_else(|| FerroError::ReferenceNotFound {
                    id: accession.to_string(),
                })?;
            return Ok(ResolvedSequence {
                refget,
                chromosome: chromosome.to_string(),
                lift: false,
            });
        }

        let refget = self
            .ctx
            .refget_accession(&format!("GRCh38:{}", chromosome))
            .await?;
        Ok(ResolvedSequence {
            refget,
            chromosome: chromosome.to_string(),
            lift: true,
        })
    }

    async fn lift(&self, chromosome: &str, pos: u64) -> Result<u64, FerroError> {
        match self.ctx.get_liftover(chromosome, pos, Assembly::GRCh38).await? {
            Some((_, lifted)) => Ok(lifted),
            None => Err(FerroError::Liftover {
                chromosome: chromosome.to_string(),
                pos,
            }),
        }
    }

    /// Fails unless `pos` names a residue on the sequence
    async fn check_position(&self, refget: &str, pos: u64) -> Result<(), FerroError> {
        let residue = self
            .ctx
            .get_reference_sequence(refget, Some(pos), None, ResidueMode::Residue)
            .await;
        match residue {
            Ok(r) if !r.is_empty() && pos > 0 => Ok(()),
            Err(FerroError::ReferenceNotFound { .. }) => Err(FerroError::resolution(format!(
                "Accession not found: {}",
                refget
            ))),
            _ => Err(FerroError::resolution(format!(
                "Position ({}) is not valid on {}",
                pos, refget
            ))),
        }
    }

    async fn bound(
        &self,
        refget: &str,
        pos0: u64,
        pos1: Option<u64>,
        pos_type: ParsedPosType,
        comparator: Option<Comparator>,
        is_start: bool,
    ) -> Result<Coordinate, FerroError> {
        let inter = |p: u64| if is_start { p.saturating_sub(1) } else { p };
        Ok(match pos_type {
            ParsedPosType::Number => Coordinate::Number(inter(pos0)),
            ParsedPosType::DefiniteRange => {
                let pos1 = pos1.ok_or_else(|| {
                    FerroError::resolution("definite ranges require a second position")
                })?;
                self.check_position(refget, pos1).await?;
                Coordinate::Range([Some(inter(pos0)), Some(inter(pos1))])
            }
            ParsedPosType::IndefiniteRange => match comparator {
                Some(Comparator::LtOrEqual) => Coordinate::Range([None, Some(inter(pos0))]),
                _ => Coordinate::Range([Some(inter(pos0)), None]),
            },
        })
    }
}
