use anyhow::Result;
use tracing::info;
use vpr_uci::UciEngine;

fn main() -> Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("vpr starting");
    UciEngine::new().run()?;
    Ok(())
}
