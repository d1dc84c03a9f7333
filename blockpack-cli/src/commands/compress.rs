//! Compress command implementation.

use crate::utils::{compressed_path, create_output, create_progress_bar, preserve_mtime, space_savings};
use blockpack_core::BlockMode;
use blockpack_lz4::HcLevel;
use blockpack_stream::{BlockWriter, StreamConfig};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::info;

/// Options of the compress command.
pub struct CompressOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub block_size: usize,
    pub mode: BlockMode,
    pub level: u8,
    pub chunk: usize,
    pub force: bool,
    pub progress: bool,
    pub json: bool,
}

/// JSON summary of a compress run.
#[derive(Serialize)]
struct CompressSummaryJson<'a> {
    input: String,
    output: String,
    config: &'a StreamConfig,
    total_in: u64,
    total_out: u64,
    savings_percent: f64,
}

pub fn cmd_compress(opts: &CompressOptions) -> Result<(), Box<dyn std::error::Error>> {
    let level = HcLevel::new(opts.level).ok_or("compression level must be between 1 and 12")?;
    let config = StreamConfig::new()
        .with_block_size(opts.block_size)
        .with_block_mode(opts.mode)
        .with_level(level);
    config.validate()?;

    let chunk = opts.chunk.max(1);
    if opts.mode == BlockMode::NoSplit && chunk > opts.block_size {
        return Err(format!(
            "chunk size {} exceeds block size {} in nosplit mode",
            chunk, opts.block_size
        )
        .into());
    }

    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| compressed_path(&opts.input));
    let input_len = std::fs::metadata(&opts.input)?.len();
    info!(input = %opts.input.display(), output = %output.display(), ?config, "compressing");

    let mut reader = BufReader::new(File::open(&opts.input)?);
    let writer = BufWriter::new(create_output(&output, opts.force)?);
    let mut block_writer = BlockWriter::new(writer, config)?;

    let pb = create_progress_bar(input_len, opts.progress);
    let mut buf = vec![0u8; chunk];
    loop {
        let n = read_full(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        block_writer.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }

    block_writer.try_finish()?;
    let (total_in, total_out) = (block_writer.total_in(), block_writer.total_out());
    drop(block_writer);
    pb.finish_and_clear();

    preserve_mtime(&opts.input, &output)?;

    if opts.json {
        let summary = CompressSummaryJson {
            input: opts.input.display().to_string(),
            output: output.display().to_string(),
            config: &config,
            total_in,
            total_out,
            savings_percent: space_savings(total_in, total_out),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} -> {}: {} -> {} bytes ({:.1}% saved)",
        opts.input.display(),
        output.display(),
        total_in,
        total_out,
        space_savings(total_in, total_out)
    );
    Ok(())
}

/// Fill `buf` from `reader`, short only at end of input.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
