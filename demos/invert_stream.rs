//! Async stream bridge example.
//!
//! Streams a file into a copy with every byte inverted, yielding to the
//! runtime before forwarding every 16th chunk.
//!
//! Run with:
//!     cargo run --example invert_stream --features async-io -- /path/to/source

use std::env;

use blockpipe::{BridgeConfig, Transformed, bridge_async};
use bytes::BytesMut;
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let src = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());
    let dst = format!("{}.inverted", src);

    let reader = tokio::fs::File::open(&src).await?;
    let writer = tokio::fs::File::create(&dst).await?;

    let mut seen = 0u64;
    let transform = move |chunk: &mut BytesMut| {
        for byte in chunk.iter_mut() {
            *byte = !*byte;
        }
        seen += 1;
        if seen % 16 == 0 {
            Transformed::Defer(Box::pin(tokio::task::yield_now()))
        } else {
            Transformed::Forward
        }
    };

    let report = bridge_async(
        reader.compat(),
        writer.compat_write(),
        BridgeConfig::default(),
        transform,
    )
    .await?;

    println!(
        "{} -> {}: {} chunks, {} bytes, {} deferred",
        src, dst, report.chunks, report.bytes_written, report.deferred
    );

    Ok(())
}
