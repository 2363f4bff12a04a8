//! A streaming route fed by timers.
//!
//! One request to `/ticks` is dispatched; the handler returns immediately
//! with the deferred sentinel while a timer task keeps writing chunks. A
//! stand-in host integration drains the body stream and prints chunks as
//! they arrive, then observes finalization.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use http::{HeaderMap, StatusCode};
use rill_sdk::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let scheduler: SharedScheduler = Arc::new(TokioScheduler::current());

    // The "host server": accepts the deferred response, drains the body as
    // a stream, and signals when the connection would close.
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let done_tx = Arc::new(Mutex::new(Some(done_tx)));
    let env = HostEnv::new().with_acceptor(move |status, _headers, source| {
        tracing::info!(%status, "host accepted deferred response");
        let done_tx = done_tx.clone();
        match source.into_stream() {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    while let Some(chunk) = stream.next().await {
                        print!("{}", chunk.as_text().unwrap_or("<binary>"));
                    }
                    tracing::info!("body finalized; connection may close");
                    if let Some(tx) = done_tx.lock().unwrap().take() {
                        let _ = tx.send(());
                    }
                });
            }
            Err(err) => tracing::error!(%err, "could not attach to deferred body"),
        }
    });

    let router = Router::new(Arc::clone(&scheduler)).stream_route(
        RouteEntry::new("/ticks"),
        |ctx, streaming, env| {
            tracing::info!(request_id = %ctx.request_id, "starting tick stream");
            streaming.before_close(|| tracing::info!("tick stream closing"));

            let writer = streaming.clone();
            tokio::spawn(async move {
                for i in 1..=3 {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    if writer.stream(format!("tick {}\n", i)).is_err() {
                        return;
                    }
                }
                let _ = writer.stream_last("that's all folks!\n");
            });

            streaming.respond(env, StatusCode::ACCEPTED, HeaderMap::new())
        },
    );

    let mut ctx = RequestContext::new(Method::Get, "/ticks");
    let outcome = router.dispatch(&env, &mut ctx);
    anyhow::ensure!(outcome.is_deferred(), "streaming route must defer");
    tracing::info!("dispatch returned; worker is free while the body streams");

    done_rx.await?;
    Ok(())
}
