//! Show the cart.

use anyhow::Result;

use crate::context::Context;
use crate::output::state_badge;

/// Run the show command.
pub async fn run(ctx: &Context) -> Result<()> {
    let engine = ctx.connect().await?;

    ctx.output.header(&format!("Cart {}", engine.cart_id()));
    ctx.output.cart(&engine.render());
    if !ctx.output.is_json() {
        ctx.output.kv("State", &state_badge(engine.state()));
    }

    engine.shutdown().await;
    Ok(())
}
