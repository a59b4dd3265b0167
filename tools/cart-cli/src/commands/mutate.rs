//! Single-mutation commands.

use anyhow::{Context as _, Result};
use turbo_cart::projector::project;
use turbo_cart::Mutation;

use super::{AddArgs, ProductArgs};
use crate::context::Context;

pub async fn add(args: AddArgs, ctx: &Context) -> Result<()> {
    apply(Mutation::add_quantity(args.product, args.quantity), ctx).await
}

pub async fn remove(args: ProductArgs, ctx: &Context) -> Result<()> {
    apply(Mutation::remove(args.product), ctx).await
}

pub async fn increase(args: ProductArgs, ctx: &Context) -> Result<()> {
    apply(Mutation::increase(args.product), ctx).await
}

pub async fn decrease(args: ProductArgs, ctx: &Context) -> Result<()> {
    apply(Mutation::decrease(args.product), ctx).await
}

/// Apply one mutation against the storefront and print the confirmed cart.
async fn apply(mutation: Mutation, ctx: &Context) -> Result<()> {
    if ctx.config.http.csrf_token.is_none() {
        ctx.output
            .warn("No http.csrf_token configured; the store may reject mutations");
    }
    let engine = ctx.connect().await?;
    let description = mutation.to_string();

    let ticket = engine.apply(mutation);
    ctx.output
        .debug(&format!("Queued {} as {}", description, ticket.request_id()));

    let result = ticket.await;
    engine.shutdown().await;
    let snapshot = result.with_context(|| format!("Failed to {}", description))?;

    ctx.output.success(&format!("Applied {}", description));
    ctx.output.cart(&project(&snapshot));
    Ok(())
}
