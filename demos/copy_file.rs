//! Block copy example.
//!
//! Copies a file through a 1 MiB buffer and counts the chunks seen by the
//! transform.
//!
//! Run with:
//!     cargo run --example copy_file -- /path/to/source /path/to/dest

use std::env;
use std::fs::File;

use blockpipe::{BlockCopier, CopyConfig, HashConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let src = args.next().unwrap_or_else(|| "Cargo.toml".to_string());
    let dst = args.next().unwrap_or_else(|| format!("{}.copy", src));

    println!("Copying {} -> {}\n", src, dst);

    let source = File::open(&src)?;
    let dest = File::create(&dst)?;

    let config = CopyConfig::new(1024 * 1024)?.with_hash_config(HashConfig::enabled());

    let mut chunks = 0u64;
    let report = BlockCopier::new(config)
        .with_transform(|chunk: &mut [u8]| {
            chunks += 1;
            println!("chunk {:>6}: {:>8} bytes", chunks, chunk.len());
        })
        .copy(source, dest)?
        .into_report();

    println!(
        "\nTotal: {} bytes in {} writes ({} full, tail {} bytes)",
        report.bytes_written,
        report.writes(),
        report.full_chunks,
        report.tail_len
    );
    if let Some(digest) = report.digest {
        println!("blake3: {}", digest);
    }

    Ok(())
}
