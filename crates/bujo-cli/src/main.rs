use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "bujo", version, about = "Bullet journal CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log journal lines (use "-" to read them from stdin)
    Log(commands::journal::LogArgs),
    /// Show one day's entries
    Day(commands::journal::DayArgs),
    /// Entry lifecycle, delete/restore and search
    Entry {
        #[command(subcommand)]
        action: commands::entry::EntryAction,
    },
    /// Lists and versioned list items
    List {
        #[command(subcommand)]
        action: commands::list::ListAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BUJO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    // a second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Log(args) => commands::journal::log(args),
        Commands::Day(args) => commands::journal::day(args),
        Commands::Entry { action } => commands::entry::run(action),
        Commands::List { action } => commands::list::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
