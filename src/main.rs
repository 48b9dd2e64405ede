//! coleta: a CLI for the recycling collection-point registry
//!
//! Finds and registers collection points against the public registry,
//! with regions and localities coming from the geographic directory and
//! map positions from geocoding with an IP-location fallback.
//!
//! ## Example Usage
//!
//! ```bash
//! # List regions, then the localities of one region
//! coleta regions
//! coleta localities SP
//!
//! # What can be collected
//! coleta items
//!
//! # Search points accepting lamps (1) and batteries (2)
//! coleta search SP "São Paulo" --items 1,2
//!
//! # Inspect one point
//! coleta show 7
//!
//! # Register a new point
//! coleta register --name "Ecoponto Central" --email eco@ponto.com \
//!     --whatsapp 5511988887777 --region SP --city "São Paulo" \
//!     --items 1,2,6 --image storefront.png
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use coleta::cli::{
    items::ItemsCmd, localities::LocalitiesCmd, regions::RegionsCmd, register::RegisterCmd,
    search::SearchCmd, show::ShowCmd, CliContext,
};
use coleta_types::ColetaConfig;

#[derive(Parser)]
#[command(
    name = "coleta",
    author,
    version,
    about = "Find and register recycling collection points",
    long_about = "A CLI for the recycling collection-point registry.\n\n\
                  Lists regions, localities and item categories, searches points by\n\
                  locality and accepted items, and registers new points."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Registry base URL (overrides COLETA_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Directory base URL (overrides COLETA_DIRECTORY_URL)
    #[arg(long, global = true)]
    directory_url: Option<String>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug-level diagnostics on stderr)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the region codes the geographic directory serves
    Regions(RegionsCmd),

    /// List the localities of one region
    Localities(LocalitiesCmd),

    /// List the recyclable item categories
    Items(ItemsCmd),

    /// Search collection points by region, locality and accepted items
    Search(SearchCmd),

    /// Register a new collection point
    Register(RegisterCmd),

    /// Show one collection point in full
    Show(ShowCmd),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Regions(_) => "regions",
            Commands::Localities(_) => "localities",
            Commands::Items(_) => "items",
            Commands::Search(_) => "search",
            Commands::Register(_) => "register",
            Commands::Show(_) => "show",
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "coleta=debug,coleta_pipeline=debug,coleta_transport=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ColetaConfig::from_env();
    if let Some(backend_url) = cli.backend_url {
        config.backend_url = backend_url;
    }
    if let Some(directory_url) = cli.directory_url {
        config.directory_url = directory_url;
    }
    let context = CliContext::new(config);

    debug!(command = cli.command.name(), "dispatching");
    match cli.command {
        Commands::Regions(cmd) => cmd.execute(&context, cli.json).await,
        Commands::Localities(cmd) => cmd.execute(&context, cli.json).await,
        Commands::Items(cmd) => cmd.execute(&context, cli.json).await,
        Commands::Search(cmd) => cmd.execute(&context, cli.json).await,
        Commands::Register(cmd) => cmd.execute(&context, cli.json).await,
        Commands::Show(cmd) => cmd.execute(&context, cli.json).await,
    }
}
