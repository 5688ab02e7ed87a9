//! Layercut CLI Tool
//!
//! Command-line interface for splitting images into layers using the
//! layercut library, by background color distance or by estimated depth.

#[cfg(feature = "cli")]
use layercut::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
