use anyhow::Context;
use ride_offer_feed::config::FeedConfig;
use ride_offer_feed::feed::{FeedView, OfferFeed};
use ride_offer_feed::generators::{MockOfferGenerator, OfferSource};
use ride_offer_feed::models::OfferId;
use ride_offer_feed::render;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the card on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("🚕 Ride Offer Feed");
    info!("==================");

    let config = match std::env::args().nth(1) {
        Some(path) => FeedConfig::load(&path).await?,
        None => FeedConfig::default(),
    };

    let generator = Arc::new(MockOfferGenerator::with_params(config.generator.clone()));
    info!("Using {} offer source", generator.source_name());

    let (handle, feed_task) = OfferFeed::spawn(generator, config);

    let mut views = handle.subscribe();
    let renderer = tokio::spawn(async move {
        let mut shown: Option<OfferId> = None;
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if let Err(e) = draw(&view, &mut shown) {
                warn!("Failed to draw: {}", e);
            }
        }
    });

    // Blocking reads live on their own thread, as tokio's stdin would keep the runtime from exiting
    let (line_tx, mut lines) = mpsc::channel::<String>(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    info!("Commands: a = accept, d = decline, c = clear, q = quit");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            line = lines.recv() => match line.as_deref().map(str::trim) {
                Some("a") => { handle.accept().await; }
                Some("d") => { handle.decline().await; }
                Some("c") => { handle.clear().await; }
                Some("q") | None => break,
                Some("") => {}
                Some(other) => warn!("Unknown command {:?}", other),
            },
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    handle.shutdown().await;
    let report = feed_task.await.context("Offer feed task failed")?;
    drop(handle);
    renderer.await.context("Renderer task failed")?;

    println!();
    println!("{}", render::session_summary(&report));
    info!("👋 Session finished");

    Ok(())
}

fn draw(view: &FeedView, shown: &mut Option<OfferId>) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    match view {
        FeedView::Blank => {}
        FeedView::Searching => {
            if shown.take().is_some() {
                writeln!(out)?;
            }
            writeln!(out, "{}", render::searching())?;
        }
        FeedView::Offer { offer, countdown } => {
            if *shown != Some(offer.id) {
                *shown = Some(offer.id);
                writeln!(out)?;
                writeln!(out, "{}", render::offer_card(offer))?;
            }
            write!(out, "\r{}", render::progress_line(countdown))?;
        }
    }
    out.flush()
}
