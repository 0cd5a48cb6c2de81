use clap::{Parser, Subcommand};
use colored::Colorize;
use unknife::commands;

#[derive(Parser)]
#[command(name = "unknife")]
#[command(about = "Remove ButterKnife view bindings from Java sources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refactor the selected files/directories in place
    Run {
        /// Files or directories to process (directories are walked recursively)
        #[arg(required = true)]
        paths: Vec<String>,
        /// Skip the confirmation prompt for multi-file batches
        #[arg(long)]
        yes: bool,
    },
    /// Dry run: print the diff `run` would apply, write nothing
    Check {
        /// Files or directories to inspect
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { paths, yes } => commands::run::execute(&paths, yes),
        Commands::Check { paths } => commands::check::execute(&paths),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
