//! CLI command implementations.

pub mod demo;
pub mod mutate;
pub mod show;

use clap::Args;

/// Arguments for the add command.
#[derive(Args)]
pub struct AddArgs {
    /// Product ID.
    pub product: String,

    /// Quantity to add.
    #[arg(short, long, default_value = "1")]
    pub quantity: u32,
}

/// Arguments for commands that act on one product.
#[derive(Args)]
pub struct ProductArgs {
    /// Product ID.
    pub product: String,
}

/// Arguments for the demo command.
#[derive(Args)]
pub struct DemoArgs {
    /// Simulated store latency in milliseconds.
    #[arg(long, default_value = "50")]
    pub latency_ms: u64,
}
