mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::ToolchainArgs;
use output::OutputFormat;

/// dynbuild - compile, link, load and call native code
#[derive(Parser)]
#[command(name = "dynbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile and link sources into a shared module
  Build {
    /// Source files, one target each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    toolchain: ToolchainArgs,
  },

  /// Build sources and call an `extern "C"` function taking and returning C ints
  Call {
    /// Source files, one target each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Function to call
    #[arg(short, long)]
    symbol: String,

    /// Integer arguments (at most 4)
    #[arg(long = "arg", allow_negative_numbers = true)]
    args: Vec<i32>,

    #[command(flatten)]
    toolchain: ToolchainArgs,
  },

  /// Build sources and report which symbols resolve
  Probe {
    /// Source files, one target each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Symbols to look up
    #[arg(short, long = "symbol", required = true)]
    symbols: Vec<String>,

    #[command(flatten)]
    toolchain: ToolchainArgs,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build { files, toolchain } => cmd::cmd_build(&files, &toolchain, cli.output),
    Commands::Call {
      files,
      symbol,
      args,
      toolchain,
    } => cmd::cmd_call(&files, &symbol, &args, &toolchain, cli.output),
    Commands::Probe {
      files,
      symbols,
      toolchain,
    } => cmd::cmd_probe(&files, &symbols, &toolchain, cli.output),
  }
}
