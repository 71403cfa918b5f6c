//! UCSC chain file parser.
//!
//! A chain aligns a source contig (`tName`) to a target contig (`qName`) as
//! a run of ungapped blocks. Coordinates in the file are 0-based half-open.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::FerroError;
use crate::reference::Strand;

/// One alignment between a source and a target contig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: u64,
    pub score: u64,
    pub source_name: String,
    pub source_start: u64,
    pub source_end: u64,
    pub target_name: String,
    pub target_size: u64,
    pub target_strand: Strand,
    pub target_start: u64,
    pub blocks: Vec<ChainBlock>,
}

/// Ungapped block followed by the gaps before the next block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainBlock {
    pub size: u64,
    pub source_gap: u64,
    pub target_gap: u64,
}

impl Chain {
    pub fn covers(&self, pos: u64) -> bool {
        (self.source_start..self.source_end).contains(&pos)
    }

    /// Map a 0-based source position; `None` outside the chain or in a gap
    pub fn map_position(&self, pos: u64) -> Option<u64> {
        if !self.covers(pos) {
            return None;
        }

        let mut source = self.source_start;
        let mut target = self.target_start;
        for block in &self.blocks {
            if pos < source {
                return None;
            }
            if pos < source + block.size {
                let mapped = target + (pos - source);
                return match self.target_strand {
                    Strand::Plus => Some(mapped),
                    Strand::Minus => self.target_size.checked_sub(mapped + 1),
                };
            }
            source += block.size + block.source_gap;
            target += block.size + block.target_gap;
        }
        None
    }
}

/// Chains indexed by source contig
#[derive(Debug, Clone, Default)]
pub struct ChainFile {
    chains: HashMap<String, Vec<Chain>>,
}

impl ChainFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `.chain` or gzipped `.chain.gz` file
    pub fn from_path(path: &Path) -> Result<Self, FerroError> {
        let file = File::open(path).map_err(|e| FerroError::Io {
            msg: format!("Failed to open chain file {}: {}", path.display(), e),
        })?;
        if path.extension().is_some_and(|ext| ext == "gz") {
            Self::parse(flate2::read::GzDecoder::new(file))
        } else {
            Self::parse(file)
        }
    }

    pub fn parse<R: Read>(reader: R) -> Result<Self, FerroError> {
        let mut file = ChainFile::new();
        let mut current: Option<Chain> = None;

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line_num = index + 1;
            let line = line.map_err(|e| FerroError::Io {
                msg: format!("Failed to read chain line {}: {}", line_num, e),
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("chain") {
                if let Some(chain) = current.take() {
                    file.add_chain(chain);
                }
                current = Some(parse_header(line, line_num)?);
            } else if let Some(chain) = current.as_mut() {
                chain.blocks.push(parse_block(line, line_num)?);
            } else {
                return Err(malformed(line_num, "alignment block before chain header"));
            }
        }
        if let Some(chain) = current {
            file.add_chain(chain);
        }

        Ok(file)
    }

    pub fn add_chain(&mut self, chain: Chain) {
        self.chains
            .entry(chain.source_name.clone())
            .or_default()
            .push(chain);
    }

    /// Highest scoring chain covering a 0-based position
    pub fn best_chain(&self, contig: &str, pos: u64) -> Option<&Chain> {
        self.chains
            .get(contig)?
            .iter()
            .filter(|c| c.covers(pos))
            .max_by_key(|c| c.score)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }
}

fn malformed(line_num: usize, what: &str) -> FerroError {
    FerroError::InvalidCoordinates {
        msg: format!("Invalid chain file at line {}: {}", line_num, what),
    }
}

fn parse_header(line: &str, line_num: usize) -> Result<Chain, FerroError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 12 {
        return Err(malformed(
            line_num,
            &format!("expected 12 header fields, got {}", fields.len()),
        ));
    }
    let number = |i: usize, name: &str| -> Result<u64, FerroError> {
        fields[i]
            .parse()
            .map_err(|_| malformed(line_num, &format!("{} is not a number", name)))
    };
    let strand = |i: usize| match fields[i] {
        "+" => Ok(Strand::Plus),
        "-" => Ok(Strand::Minus),
        other => Err(malformed(line_num, &format!("unknown strand '{}'", other))),
    };

    if strand(4)? != Strand::Plus {
        return Err(malformed(line_num, "source strand must be '+'"));
    }
    Ok(Chain {
        id: fields.get(12).and_then(|id| id.parse().ok()).unwrap_or(0),
        score: number(1, "score")?,
        source_name: fields[2].to_string(),
        source_start: number(5, "source start")?,
        source_end: number(6, "source end")?,
        target_name: fields[7].to_string(),
        target_size: number(8, "target size")?,
        target_strand: strand(9)?,
        target_start: number(10, "target start")?,
        blocks: Vec::new(),
    })
}

fn parse_block(line: &str, line_num: usize) -> Result<ChainBlock, FerroError> {
    let numbers = line
        .split_whitespace()
        .map(|f| {
            f.parse::<u64>()
                .map_err(|_| malformed(line_num, &format!("'{}' is not a block size", f)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match numbers[..] {
        [size] => Ok(ChainBlock {
            size,
            source_gap: 0,
            target_gap: 0,
        }),
        [size, source_gap, target_gap] => Ok(ChainBlock {
            size,
            source_gap,
            target_gap,
        }),
        _ => Err(malformed(line_num, "expected 1 or 3 block fields")),
    }
}
