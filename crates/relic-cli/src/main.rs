use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relic_cli::{
    BifCommands, CabCommands, KeyCommands, LogFormat, MveCommands, OutputFormat, commands,
};

#[derive(Parser)]
#[command(
    name = "relic",
    about = "Read archives, installer cabinets and movies of 1990s isometric RPGs",
    version,
    long_about = "Lists and extracts resources from BIFF/BIFC archives through the chitin.key index, \
                  unpacks multi-volume installer cabinets, and exports Interplay MVE movies as PNG frames."
)]
struct Cli {
    /// Output format for listings
    #[arg(long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    /// Log line format; the level is taken from RUST_LOG
    #[arg(long, value_enum, global = true, env = "RELIC_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and extract BIFF/BIFC archives
    #[command(subcommand)]
    Bif(BifCommands),

    /// Browse the chitin.key resource index
    #[command(subcommand)]
    Key(KeyCommands),

    /// List, extract and install installer cabinets
    #[command(subcommand)]
    Cab(CabCommands),

    /// Inspect and export MVE movies
    #[command(subcommand)]
    Mve(MveCommands),
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Bif(cmd) => commands::bif::handle(cmd, cli.format)?,
        Commands::Key(cmd) => commands::key::handle(cmd, cli.format)?,
        Commands::Cab(cmd) => commands::cab::handle(cmd, cli.format)?,
        Commands::Mve(cmd) => commands::mve::handle(cmd, cli.format).await?,
    }

    Ok(())
}
