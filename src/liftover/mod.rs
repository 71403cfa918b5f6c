//! Chain-file liftover between GRCh37 and GRCh38.
//!
//! [`ChainLiftover`] implements [`LiftoverService`] from UCSC chain files,
//! one per target assembly. Chain files can be downloaded from:
//! - <https://hgdownload.cse.ucsc.edu/goldenpath/hg19/liftOver/hg19ToHg38.over.chain.gz>
//! - <https://hgdownload.cse.ucsc.edu/goldenpath/hg38/liftOver/hg38ToHg19.over.chain.gz>
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use ferro_vrs::liftover::ChainLiftover;
//!
//! let liftover = ChainLiftover::from_paths(
//!     Some(Path::new("hg19ToHg38.over.chain.gz")),
//!     None,
//! )
//! .unwrap();
//! ```

pub mod chain;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use crate::error::FerroError;
use crate::reference::{Assembly, LiftoverService};

pub use chain::{Chain, ChainBlock, ChainFile};

/// UCSC-style contig name (`7` and `chr7` are the same chromosome)
pub fn ucsc_contig(chromosome: &str) -> String {
    format!("chr{}", chromosome.trim_start_matches("chr"))
}

/// Liftover backed by chain files keyed by target assembly
#[derive(Debug, Default)]
pub struct ChainLiftover {
    chains: HashMap<Assembly, ChainFile>,
}

impl ChainLiftover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chains lifting onto `target`
    pub fn with_chains(mut self, target: Assembly, chains: ChainFile) -> Self {
        self.chains.insert(target, chains);
        self
    }

    /// Load the GRCh37 to GRCh38 and GRCh38 to GRCh37 chain files
    pub fn from_paths(
        grch37_to_38: Option<&Path>,
        grch38_to_37: Option<&Path>,
    ) -> Result<Self, FerroError> {
        let mut liftover = Self::new();
        for (target, path) in [
            (Assembly::GRCh38, grch37_to_38),
            (Assembly::GRCh37, grch38_to_37),
        ] {
            if let Some(path) = path {
                let chains = ChainFile::from_path(path)?;
                tracing::info!(
                    path = %path.display(),
                    %target,
                    chains = chains.chain_count(),
                    "loaded chain file"
                );
                liftover = liftover.with_chains(target, chains);
            }
        }
        Ok(liftover)
    }

    /// Lift a 1-based position
    pub fn lift(&self, chromosome: &str, pos: u64, target: Assembly) -> Option<(String, u64)> {
        let chains = self.chains.get(&target)?;
        let contig = ucsc_contig(chromosome);
        let index = pos.checked_sub(1)?;
        let chain = chains.best_chain(&contig, index)?;
        let mapped = chain.map_position(index)?;
        Some((chain.target_name.clone(), mapped + 1))
    }
}

#[async_trait]
impl LiftoverService for ChainLiftover {
    async fn get_liftover(
        &self,
        chromosome: &str,
        pos: u64,
        target: Assembly,
    ) -> Result<Option<(String, u64)>, FerroError> {
        if !self.chains.contains_key(&target) {
            return Err(FerroError::collaborator(
                "liftover",
                format!("no chain file loaded for {}", target),
            ));
        }
        let lifted = self.lift(chromosome, pos, target);
        if lifted.is_none() {
            tracing::debug!(chromosome, pos, %target, "position did not lift");
        }
        Ok(lifted)
    }
}
