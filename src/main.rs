use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "orgchart")]
#[command(about = "Build, inspect and lay out organization charts from manager links")]
#[command(version)]
struct Cli {
    /// Path to the data directory (default: .orgchart in current dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Output as JSON for machine consumption
    #[arg(long, global = true)]
    json: bool,

    /// Log decisions (grouping, orphans, lookups) to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a data directory
    Init {
        /// Seed it with the built-in 45-person sample organization
        #[arg(long)]
        mock: bool,
    },

    /// Print the org tree
    Tree {
        /// Do not insert department group nodes
        #[arg(long)]
        no_grouping: bool,

        /// Show only the part of the chart below this person
        #[arg(long)]
        root: Option<String>,
    },

    /// Compute node positions and edge routes
    Layout {
        /// Use the cluster layout of the tree view instead of the configured mode
        #[arg(long)]
        cluster: bool,
    },

    /// Search people by name, title, department or email
    Search {
        /// Free-text query (case-insensitive)
        query: Option<String>,

        /// Only people in this department (exact match)
        #[arg(long)]
        department: Option<String>,
    },

    /// Show one person: manager chain, direct reports and team size
    Show {
        /// Person ID
        id: String,
    },

    /// List departments
    Departments,

    /// Check manager links for loops, dangling references and orphans
    Check,

    /// Export the employee list as CSV
    Export {
        /// Output path (default: <prefix>-YYYY-MM-DD.csv in current dir)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Edit manager links
    Manager {
        #[command(subcommand)]
        command: ManagerCommands,
    },

    /// Hide a person from the chart
    Exclude {
        /// Person ID
        id: String,
    },

    /// Show a previously excluded person again
    Include {
        /// Person ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ManagerCommands {
    /// Set a person's manager
    Set {
        /// Person ID
        id: String,
        /// Manager's person ID
        manager: String,
    },

    /// Remove a person's manager link
    Remove {
        /// Person ID
        id: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dir = cli.dir.unwrap_or_else(|| PathBuf::from(".orgchart"));

    match cli.command {
        Commands::Init { mock } => commands::init::run(&dir, mock),
        Commands::Tree { no_grouping, root } => {
            commands::tree::run(&dir, no_grouping, root.as_deref(), cli.json)
        }
        Commands::Layout { cluster } => commands::layout::run(&dir, cluster, cli.json),
        Commands::Search { query, department } => commands::search::run(
            &dir,
            query.as_deref().unwrap_or(""),
            department.as_deref(),
            cli.json,
        ),
        Commands::Show { id } => commands::show::run(&dir, &id, cli.json),
        Commands::Departments => commands::departments::run(&dir, cli.json),
        Commands::Check => commands::check::run(&dir, cli.json),
        Commands::Export { output } => commands::export::run(&dir, output.as_deref()),
        Commands::Manager { command } => match command {
            ManagerCommands::Set { id, manager } => {
                commands::manager::set(&dir, &id, &manager, cli.json)
            }
            ManagerCommands::Remove { id } => commands::manager::remove(&dir, &id, cli.json),
        },
        Commands::Exclude { id } => commands::exclude::run(&dir, &id, true),
        Commands::Include { id } => commands::exclude::run(&dir, &id, false),
    }
}
