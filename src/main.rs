mod cli;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "dspadpcm", version, about, next_line_help(false))]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub subcommand: Subcommands,
}

#[derive(Subcommand)]
pub enum Subcommands {
    Encode(cli::encode::EncodeArgs),
    Decode(cli::decode::DecodeArgs),
    Info(cli::info::InfoArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.subcommand {
        Subcommands::Encode(args) => cli::encode::run(&args)?,
        Subcommands::Decode(args) => cli::decode::run(&args)?,
        Subcommands::Info(args) => cli::info::run(&args)?,
    }

    Ok(())
}
