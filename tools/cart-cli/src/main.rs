//! Cart CLI - drive the TurboCart sync engine from a terminal.
//!
//! Commands:
//! - `cart show` - Fetch and print the cart
//! - `cart add` - Add a product
//! - `cart remove` - Remove a product
//! - `cart increase` / `cart decrease` - Step a line's quantity
//! - `cart demo` - Run a scripted session against an in-memory store

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AddArgs, DemoArgs, ProductArgs};

/// Cart CLI - Keep a local mirror of a storefront cart in sync
#[derive(Parser)]
#[command(name = "cart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the cart and print it
    Show,

    /// Add a product to the cart
    Add(AddArgs),

    /// Remove a product from the cart
    Remove(ProductArgs),

    /// Increase a line's quantity by one
    Increase(ProductArgs),

    /// Decrease a line's quantity by one, removing it at zero
    Decrease(ProductArgs),

    /// Run a scripted session against an in-memory store
    Demo(DemoArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "turbo_cart_sync=debug,turbo_cart_http=debug,warn"
    } else {
        "turbo_cart_sync=info,turbo_cart_http=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let result = match cli.command {
        Commands::Show => commands::show::run(&ctx).await,
        Commands::Add(args) => commands::mutate::add(args, &ctx).await,
        Commands::Remove(args) => commands::mutate::remove(args, &ctx).await,
        Commands::Increase(args) => commands::mutate::increase(args, &ctx).await,
        Commands::Decrease(args) => commands::mutate::decrease(args, &ctx).await,
        Commands::Demo(args) => commands::demo::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
