//! Info command implementation.

use crate::utils::space_savings;
use blockpack_stream::{BlockInfo, scan_blocks, total_uncompressed};
use serde::Serialize;
use std::path::Path;

/// JSON output of the info command.
#[derive(Debug, Serialize)]
struct StreamInfoJson<'a> {
    file: String,
    size: u64,
    block_count: usize,
    uncompressed_size: u64,
    ratio: f64,
    largest_block: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocks: Option<&'a [BlockInfo]>,
}

pub fn cmd_info(input: &Path, json: bool, list_blocks: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let blocks = scan_blocks(&data)?;
    let uncompressed = total_uncompressed(&blocks);
    let largest = blocks.iter().map(|b| b.uncompressed_size).max().unwrap_or(0);
    let size = data.len() as u64;

    if json {
        let info = StreamInfoJson {
            file: input.display().to_string(),
            size,
            block_count: blocks.len(),
            uncompressed_size: uncompressed,
            ratio: space_savings(uncompressed, size),
            largest_block: largest,
            blocks: list_blocks.then_some(blocks.as_slice()),
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Stream Information");
    println!("==================");
    println!("File: {}", input.display());
    println!("Size: {} bytes", size);
    println!("Blocks: {}", blocks.len());
    println!("Uncompressed size: {} bytes", uncompressed);
    println!("Largest block: {} bytes", largest);
    if uncompressed > 0 {
        println!("Space savings: {:.1}%", space_savings(uncompressed, size));
    }

    if list_blocks {
        println!();
        println!(
            "{:>6} {:>12} {:>10} {:>10} {:>10}",
            "Block", "Offset", "Packed", "Size", "CRC-32"
        );
        println!("{}", "-".repeat(52));
        for (index, block) in blocks.iter().enumerate() {
            println!(
                "{:>6} {:>12} {:>10} {:>10}   {:08x}",
                index, block.offset, block.compressed_size, block.uncompressed_size, block.checksum
            );
        }
    }

    Ok(())
}
