// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-vrs CLI
//!
//! Translate variant descriptions into GA4GH VRS objects from the command line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use flate2::read::MultiGzDecoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::util::SubscriberInitExt;

use ferro_vrs::query::AmplificationQuery;
use ferro_vrs::reference::{Assembly, ResidueMode};
use ferro_vrs::{CopyChange, DupDelMode, NormalizerConfig, QueryContext, QueryHandler};

#[derive(Parser)]
#[command(name = "ferro-vrs")]
#[command(author, version, about = "Translate variant descriptions into GA4GH VRS objects")]
#[command(
    long_about = "Translate free text, HGVS and gnomAD VCF variant descriptions into GA4GH VRS objects.

Examples:
  ferro-vrs to-vrs 'NC_000007.13:g.140453136A>T'
  ferro-vrs normalize 'BRAF V600E'
  ferro-vrs normalize -i queries.txt.gz
  ferro-vrs copy-number-count 'NC_000001.11:g.(?_1000)_(2000_?)dup' --baseline-copies 2
  ferro-vrs map p-to-c --accession NP_004324.2 --start 600 --end 600"
)]
struct Cli {
    /// Normalizer configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON reference fixture, overrides the configured one
    #[arg(long, global = true)]
    reference_json: Option<PathBuf>,

    /// Log level or filter directive; RUST_LOG wins when set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a query into tokens
    Tokenize {
        query: Option<String>,
        /// Input file (one query per line, may be gzipped)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Classify a query
    Classify {
        query: Option<String>,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Every VRS variation a query denotes
    ToVrs {
        query: Option<String>,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// The single representative VRS variation for a query
    Normalize {
        query: Option<String>,
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Representation for HGVS duplications and deletions
        #[arg(long, default_value = "default")]
        mode: DupDelMode,

        /// Baseline copies, required for copy_number_count mode
        #[arg(long)]
        baseline_copies: Option<u64>,

        /// EFO copy change code, e.g. efo:0030070
        #[arg(long, value_parser = parse_label::<CopyChange>)]
        copy_change: Option<CopyChange>,
    },

    /// Copy number count for an HGVS genomic duplication or deletion
    CopyNumberCount {
        hgvs_expr: String,
        #[arg(long)]
        baseline_copies: u64,
        /// Lift GRCh37 locations to GRCh38
        #[arg(long)]
        liftover: bool,
    },

    /// Copy number change for an HGVS genomic duplication or deletion
    CopyNumberChange {
        hgvs_expr: String,
        #[arg(long, value_parser = parse_label::<CopyChange>)]
        copy_change: Option<CopyChange>,
        #[arg(long)]
        liftover: bool,
    },

    /// High level gain copy number change for a gene amplification
    Amplification {
        #[arg(long)]
        gene: String,
        #[arg(long)]
        sequence_id: Option<String>,
        #[arg(long)]
        start: Option<u64>,
        #[arg(long)]
        end: Option<u64>,
    },

    /// Map positions between protein, cDNA and genomic coordinates
    Map {
        /// One of p-to-c, c-to-g or p-to-g
        #[arg(value_parser = ["p-to-c", "c-to-g", "p-to-g"])]
        direction: String,
        #[arg(long)]
        accession: String,
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
        /// Known CDS start for c-to-g
        #[arg(long)]
        cds_start: Option<u64>,
        /// Positions are 0-based inter-residue
        #[arg(long)]
        inter_residue: bool,
        #[arg(long, default_value = "GRCh38", value_parser = Assembly::parse)]
        assembly: Assembly,
    },

    /// Print the default normalizer configuration as TOML
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;

    if let Commands::Config { output } = &cli.command {
        return run_config(output.as_deref());
    }

    let config = load_config(cli.config.as_deref(), cli.reference_json)?;
    let handler = QueryHandler::new(QueryContext::from_config(&config)?)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(handler, cli.command))
}

async fn run(handler: QueryHandler, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = BufWriter::new(io::stdout());

    match command {
        Commands::Tokenize { query, input } => {
            for q in queries(query, input.as_deref())? {
                let (tokens, warnings) = handler.tokenize(&q).await;
                emit(
                    &mut out,
                    &serde_json::json!({ "query": q, "tokens": tokens, "warnings": warnings }),
                )?;
            }
        }
        Commands::Classify { query, input } => {
            for q in queries(query, input.as_deref())? {
                let (classification, warnings) = handler.classify(&q).await;
                emit(
                    &mut out,
                    &serde_json::json!({
                        "query": q,
                        "classification": classification,
                        "warnings": warnings,
                    }),
                )?;
            }
        }
        Commands::ToVrs { query, input } => {
            for q in queries(query, input.as_deref())? {
                emit(&mut out, &handler.to_vrs(&q).await)?;
            }
        }
        Commands::Normalize {
            query,
            input,
            mode,
            baseline_copies,
            copy_change,
        } => {
            for q in queries(query, input.as_deref())? {
                let response = handler
                    .normalize(&q, mode, baseline_copies, copy_change)
                    .await;
                emit(&mut out, &response)?;
            }
        }
        Commands::CopyNumberCount {
            hgvs_expr,
            baseline_copies,
            liftover,
        } => {
            let response = handler
                .hgvs_to_copy_number_count(&hgvs_expr, baseline_copies, liftover)
                .await;
            emit(&mut out, &response)?;
        }
        Commands::CopyNumberChange {
            hgvs_expr,
            copy_change,
            liftover,
        } => {
            let response = handler
                .hgvs_to_copy_number_change(&hgvs_expr, copy_change, liftover)
                .await;
            emit(&mut out, &response)?;
        }
        Commands::Amplification {
            gene,
            sequence_id,
            start,
            end,
        } => {
            let query = AmplificationQuery {
                gene,
                sequence_id,
                start,
                end,
            };
            emit(&mut out, &handler.amplification_to_cx_var(query).await)?;
        }
        Commands::Map {
            direction,
            accession,
            start,
            end,
            cds_start,
            inter_residue,
            assembly,
        } => {
            let mode = if inter_residue {
                ResidueMode::InterResidue
            } else {
                ResidueMode::Residue
            };
            match direction.as_str() {
                "p-to-c" => emit(&mut out, &handler.p_to_c(&accession, start, end, mode).await)?,
                "c-to-g" => emit(
                    &mut out,
                    &handler
                        .c_to_g(&accession, start, end, cds_start, mode, assembly)
                        .await,
                )?,
                _ => emit(
                    &mut out,
                    &handler.p_to_g(&accession, start, end, mode, assembly).await,
                )?,
            }
        }
        Commands::Config { .. } => {}
    }

    out.flush()?;
    Ok(())
}

fn run_config(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = NormalizerConfig::default();
    match output {
        Some(path) => {
            config.to_file(path)?;
            eprintln!("Configuration written to {}", path.display());
        }
        None => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}

fn load_config(
    path: Option<&Path>,
    reference_json: Option<PathBuf>,
) -> Result<NormalizerConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            NormalizerConfig::from_file(path)?
        }
        None => NormalizerConfig::load().unwrap_or_default(),
    };
    if reference_json.is_some() {
        config.data.reference_json = reference_json;
    }
    Ok(config)
}

/// The positional query, or every non-blank line of the input file (`-` for stdin)
fn queries(
    query: Option<String>,
    input: Option<&Path>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if let Some(q) = query {
        return Ok(vec![q]);
    }

    let reader: Box<dyn BufRead> = match input {
        None => Box::new(BufReader::new(io::stdin())),
        Some(p) if p.as_os_str() == "-" => Box::new(BufReader::new(io::stdin())),
        Some(p) if p.extension().is_some_and(|ext| ext == "gz") => {
            Box::new(BufReader::new(MultiGzDecoder::new(File::open(p)?)))
        }
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
    };

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            lines.push(line.to_string());
        }
    }
    debug!(count = lines.len(), "read queries");
    Ok(lines)
}

fn emit<T: Serialize>(out: &mut impl Write, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Parse a serde label such as `efo:0030070`
fn parse_label<T: DeserializeOwned>(label: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(label.to_string()))
        .map_err(|e| format!("invalid value '{}': {}", label, e))
}

fn init_tracing(level: &str, json_logs: bool) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| format!("Invalid log level '{}': {}", level, e))?,
    };

    // Logs go to stderr so stdout stays JSON
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }

    Ok(())
}
