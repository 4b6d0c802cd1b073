use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{FunctionReport, MetadataReport};
use color_eyre::eyre::Result;
use raster_chain::{ChainDefinition, FunctionKind};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve key metadata at the end of a chain
    Metadata {
        /// Path to the TOML or JSON chain definition
        #[arg(short, long)]
        chain: PathBuf,
        /// Band index, -1 for the whole raster; every scope when omitted
        #[arg(short, long, allow_hyphen_values = true)]
        band: Option<i64>,
    },
    /// List registered raster functions
    Functions,
    /// Show the declared parameters of a function
    Parameters {
        /// Function name, e.g. key_metadata_override
        function: String,
    },
    /// Print the JSON schema for chain definitions
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    cli::init_tracing();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Metadata { chain, band } => {
            let definition = ChainDefinition::from_file(chain)?;
            let mut chain = definition.build()?;
            info!("{}", chain.info());

            let output = match band {
                Some(index) => serde_json::to_string_pretty(&chain.key_metadata(*index))?,
                None => serde_json::to_string_pretty(&MetadataReport::collect(&mut chain))?,
            };
            println!("{output}");
        }
        Commands::Functions => {
            for name in FunctionKind::function_names() {
                let kind = FunctionKind::from_name(name)?;
                println!("{name}: {}", kind.description());
            }
        }
        Commands::Parameters { function } => {
            let report = FunctionReport::new(FunctionKind::from_name(function)?);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&ChainDefinition::schema())?);
        }
    }

    Ok(())
}
