//! Decompress command implementation.

use crate::utils::{create_output, create_progress_bar, decompressed_path, preserve_mtime};
use blockpack_stream::BlockReader;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

pub fn cmd_decompress(
    input: &Path,
    output: Option<&Path>,
    check_crc: bool,
    force: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| decompressed_path(input), Path::to_path_buf);
    let input_len = std::fs::metadata(input)?.len();
    info!(input = %input.display(), output = %output.display(), check_crc, "decompressing");

    let mut reader = BlockReader::new(BufReader::new(File::open(input)?), check_crc);
    let mut writer = BufWriter::new(create_output(&output, force)?);

    let pb = create_progress_bar(input_len, progress);
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        pb.set_position(reader.total_in());
    }
    writer.flush()?;
    drop(writer);
    pb.finish_and_clear();

    preserve_mtime(input, &output)?;

    println!(
        "{} -> {}: {} -> {} bytes",
        input.display(),
        output.display(),
        reader.total_in(),
        reader.total_out()
    );
    Ok(())
}
