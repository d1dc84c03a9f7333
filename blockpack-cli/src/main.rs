//! blockpack CLI - block-framed LZ4-HC stream compression
//!
//! Compresses files the way a sector-oriented writer would feed the stream
//! engine: in small fixed-size writes, assembled into large CRC-protected
//! blocks.

mod commands;
mod utils;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use blockpack_core::BlockMode;
use blockpack_stream::DEFAULT_BLOCK_SIZE;
use commands::{cmd_compress, cmd_decompress, cmd_info, cmd_test};

#[derive(Parser)]
#[command(name = "blockpack")]
#[command(author, version, about = "Block-framed LZ4-HC stream compression")]
#[command(long_about = "
blockpack assembles a byte stream into fixed-size blocks, compresses each block
with LZ4-HC and protects it with a CRC-32 header.

Examples:
  blockpack compress disk.img
  blockpack compress disk.img -o disk.bpk --block-size 131072 --level 12
  blockpack compress log.txt --mode nosplit --chunk 4096
  blockpack decompress disk.img.bpk
  blockpack test disk.img.bpk
  blockpack info disk.img.bpk --json
  blockpack completions bash > blockpack.bash
")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a block stream
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (default: input with .bpk appended)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Uncompressed bytes per block
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Block fill policy
        #[arg(short, long, value_enum, default_value = "split")]
        mode: ModeArg,

        /// LZ4-HC compression level (1-12)
        #[arg(short, long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(1..=12))]
        level: u8,

        /// Size of each write fed to the stream
        #[arg(long, default_value_t = 512)]
        chunk: usize,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,

        /// Print the summary and the active configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decompress a block stream
    #[command(alias = "d")]
    Decompress {
        /// Block stream to decompress
        input: PathBuf,

        /// Output file (default: input without .bpk)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip block checksum verification
        #[arg(long)]
        no_crc: bool,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Verify every block of a stream
    #[command(alias = "t")]
    Test {
        /// Block stream to test
        input: PathBuf,

        /// List every block
        #[arg(long)]
        blocks: bool,
    },

    /// Show information about a block stream
    #[command(alias = "i")]
    Info {
        /// Block stream to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// List every block
        #[arg(long)]
        blocks: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Block fill policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Fill every block to capacity
    Split,
    /// Never split one write across blocks
    Nosplit,
}

impl From<ModeArg> for BlockMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Split => BlockMode::Split,
            ModeArg::Nosplit => BlockMode::NoSplit,
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            block_size,
            mode,
            level,
            chunk,
            force,
            quiet,
            json,
        } => cmd_compress(&commands::CompressOptions {
            input,
            output,
            block_size,
            mode: mode.into(),
            level,
            chunk,
            force,
            progress: !quiet && !json,
            json,
        }),
        Commands::Decompress {
            input,
            output,
            no_crc,
            force,
            quiet,
        } => cmd_decompress(&input, output.as_deref(), !no_crc, force, !quiet),
        Commands::Test { input, blocks } => cmd_test(&input, blocks),
        Commands::Info {
            input,
            json,
            blocks,
        } => cmd_info(&input, json, blocks),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "blockpack", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
