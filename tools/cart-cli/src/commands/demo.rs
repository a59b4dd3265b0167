//! Scripted session against an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use turbo_cart::operation::ProductListing;
use turbo_cart::{Currency, Money};
use turbo_cart_sync::{EventSubscription, InMemoryStore, SyncEngine, SyncError};

use super::DemoArgs;
use crate::context::Context;
use crate::output::state_badge;

type Engine = SyncEngine<Arc<InMemoryStore>>;

/// Run the demo command.
pub async fn run(args: DemoArgs, ctx: &Context) -> Result<()> {
    let currency = ctx.config.sync.currency;
    let price = |cents| Money::new(cents, currency);

    let store = Arc::new(
        InMemoryStore::new(currency)
            .with_product("1", "Kiondo Basket", price(125_000))
            .with_product("2", "Kikoi", price(80_000))
            .with_stocked_product("3", "Maasai Shuka", price(150_000), 0),
    );
    let latency = Duration::from_millis(args.latency_ms);
    store.set_latency(latency);

    let engine = SyncEngine::new("demo", store.clone(), ctx.config.sync.clone());
    let mut events = engine.subscribe();

    step(ctx, "Add 2 x Kiondo Basket");
    engine
        .add_listing("1", 2, ProductListing::new("Kiondo Basket", price(125_000)))
        .await?;
    flush(ctx, &mut events);

    step(ctx, "Increase Kiondo Basket");
    engine.increase("1").await?;
    flush(ctx, &mut events);

    step(ctx, "Add an out-of-stock product");
    match engine.add("3").await {
        Err(SyncError::MutationFailed { .. }) => {}
        Err(e) => return Err(e.into()),
        Ok(_) => bail!("out-of-stock add unexpectedly succeeded"),
    }
    flush(ctx, &mut events);

    step(ctx, "Add Kikoi and decrease Kiondo Basket back to back");
    let add = engine.add_listing("2", 1, ProductListing::new("Kikoi", price(80_000)));
    let decrease = engine.decrease("1");
    ctx.output
        .kv("State while queued", &state_badge(engine.state()));
    let (added, decreased) = futures::join!(add, decrease);
    added?;
    decreased?;
    flush(ctx, &mut events);

    step(ctx, "Remove a product that is not in the cart");
    engine.remove("9").await?;
    flush(ctx, &mut events);

    step(ctx, "Two refreshes answered out of order");
    store.delay_next_fetches([latency * 3, latency / 5]);
    reordered_refreshes(&engine, &store).await?;
    flush(ctx, &mut events);

    ctx.output.header("Final cart");
    ctx.output.cart(&engine.render());
    if !ctx.output.is_json() {
        ctx.output.kv(
            "Mutations sent",
            &store.mutation_log().len().to_string(),
        );
        ctx.output
            .kv("Max in flight", &store.max_concurrent_mutations().to_string());
    }

    engine.shutdown().await;
    Ok(())
}

/// Start a slow refresh, change the cart behind its back, then start a fast one.
async fn reordered_refreshes(engine: &Engine, store: &InMemoryStore) -> Result<()> {
    let slow = engine.refresh();
    let fast = async {
        store.seed_line("2", 4);
        engine.refresh().await
    };
    let (slow, fast) = futures::join!(slow, fast);
    let (slow, fast) = (slow?, fast?);

    if slow != fast {
        bail!("late refresh overwrote a newer snapshot");
    }
    Ok(())
}

fn step(ctx: &Context, title: &str) {
    ctx.output.header(title);
}

fn flush(ctx: &Context, events: &mut EventSubscription) {
    for event in events.drain() {
        ctx.output.event(&event);
    }
}
