//! biograph CLI
//!
//! File-based driver for the assembly and grounding pipeline:
//! - `assemble`: read statement corpora + an ontology, build each model's
//!   graph, ground it, and write preamble-headed JSONL outputs
//! - `preamble`: print the projection preamble for a record kind

use anyhow::Result;
use clap::{Parser, Subcommand};

mod pipeline;

#[derive(Parser)]
#[command(name = "biograph")]
#[command(
    author,
    version,
    about = "Assemble statement corpora into ontology-grounded knowledge graphs"
)]
struct Cli {
    /// Increase log verbosity (`-v` info, `-vv` debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble one or more models and ground them against an ontology.
    Assemble(pipeline::AssembleArgs),

    /// Print the projection preamble for a record kind.
    Preamble {
        /// One of: models, tests, paths, edges, evidences, docs, nodes,
        /// nodeAtts, groups.
        kind: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assemble(args) => pipeline::run(args),
        Commands::Preamble { kind } => {
            let kind: biograph_model::preamble::RecordKind = kind.parse()?;
            println!("{}", serde_json::to_string_pretty(&kind.preamble_object())?);
            Ok(())
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
