use crate::config::FeedConfig;
use crate::countdown::{Countdown, CountdownView};
use crate::generators::OfferSource;
use crate::models::{FeedStats, Offer, Outcome, ResolvedOffer};
use crate::widget::{OfferCallbacks, RideOfferWidget, UserAction};
use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 16;

/// What the screen shows right now
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedView {
    /// Nothing at all, only before the very first offer
    Blank,
    /// No offer on screen, waiting for the next one
    Searching,
    Offer {
        offer: Offer,
        countdown: CountdownView,
    },
}

impl FeedView {
    pub fn offer(&self) -> Option<&Offer> {
        match self {
            FeedView::Offer { offer, .. } => Some(offer),
            _ => None,
        }
    }
}

/// Input accepted by a running feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCommand {
    /// Forwarded to the current offer's tap targets
    Action(UserAction),
    /// Remove the current offer without an outcome
    Clear,
    Shutdown,
}

/// What a feed hands back when it stops
#[derive(Debug, Clone, Serialize)]
pub struct FeedReport {
    pub stats: FeedStats,
    pub history: Vec<ResolvedOffer>,
}

/// Cloneable control surface for a running [`OfferFeed`]
#[derive(Debug, Clone)]
pub struct FeedHandle {
    commands: mpsc::Sender<FeedCommand>,
    view: watch::Receiver<FeedView>,
    stats: watch::Receiver<FeedStats>,
}

impl FeedHandle {
    /// Returns false if the feed has already stopped
    pub async fn send(&self, command: FeedCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn accept(&self) -> bool {
        self.send(FeedCommand::Action(UserAction::Accept)).await
    }

    pub async fn decline(&self) -> bool {
        self.send(FeedCommand::Action(UserAction::Decline)).await
    }

    pub async fn clear(&self) -> bool {
        self.send(FeedCommand::Clear).await
    }

    pub async fn shutdown(&self) -> bool {
        self.send(FeedCommand::Shutdown).await
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        self.view.clone()
    }

    pub fn view(&self) -> FeedView {
        self.view.borrow().clone()
    }

    pub fn stats(&self) -> FeedStats {
        *self.stats.borrow()
    }
}

/// Owner of the one-offer-at-a-time lifecycle.
///
/// Cycles forever between searching and showing an offer until it receives
/// [`FeedCommand::Shutdown`] or every [`FeedHandle`] is dropped.
pub struct OfferFeed {
    source: Arc<dyn OfferSource>,
    config: FeedConfig,
    countdown: Countdown,
    commands: mpsc::Receiver<FeedCommand>,
    view: watch::Sender<FeedView>,
    stats: Arc<watch::Sender<FeedStats>>,
    history: VecDeque<ResolvedOffer>,
}

/// How an offer left the screen, including removal by the owner
enum Exit {
    Resolved(Outcome),
    Cleared,
    Stopped,
}

impl OfferFeed {
    pub fn new(source: Arc<dyn OfferSource>, config: FeedConfig) -> (Self, FeedHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(FeedView::Blank);
        let (stats_tx, stats_rx) = watch::channel(FeedStats::default());

        let feed = Self {
            source,
            countdown: Countdown::from_secs(config.countdown_secs),
            config,
            commands: command_rx,
            view: view_tx,
            stats: Arc::new(stats_tx),
            history: VecDeque::new(),
        };

        let handle = FeedHandle {
            commands: command_tx,
            view: view_rx,
            stats: stats_rx,
        };

        (feed, handle)
    }

    /// Start a feed on the current runtime
    pub fn spawn(source: Arc<dyn OfferSource>, config: FeedConfig) -> (FeedHandle, JoinHandle<FeedReport>) {
        let (feed, handle) = Self::new(source, config);
        (handle, tokio::spawn(feed.run()))
    }

    pub async fn run(self) -> FeedReport {
        let OfferFeed {
            source,
            config,
            mut countdown,
            mut commands,
            view,
            stats,
            mut history,
        } = self;

        let settle_delay = config.settle_delay();
        let frame_interval = config.frame_interval();
        info!(
            "Offer feed started with {} source, {}s countdown, {:?} settling delay",
            source.source_name(),
            countdown.total().as_secs(),
            settle_delay
        );

        let mut first = true;
        loop {
            // Nothing is shown until the first offer arrives
            if first {
                first = false;
            } else {
                view.send_replace(FeedView::Searching);
                info!("Searching for the next offer");
            }

            let settle = sleep(settle_delay);
            tokio::pin!(settle);
            loop {
                tokio::select! {
                    _ = &mut settle => break,
                    command = commands.recv() => match command {
                        Some(FeedCommand::Action(action)) => {
                            debug!("Ignoring {:?}, no offer on screen", action);
                        }
                        Some(FeedCommand::Clear) => debug!("Nothing to clear"),
                        Some(FeedCommand::Shutdown) | None => {
                            return finish(&view, &stats, history);
                        }
                    },
                }
            }

            let offer = source.next_offer().await;
            let offer_id = offer.id;
            let fare = offer.fare;
            stats.send_modify(|s| s.offered += 1);

            let exit = {
                let (widget, actions) = RideOfferWidget::mount(offer, &mut countdown, frame_interval);
                let run = widget.run(outcome_callbacks(&stats), |offer, countdown| {
                    view.send_replace(FeedView::Offer {
                        offer: offer.clone(),
                        countdown,
                    });
                });
                tokio::pin!(run);

                loop {
                    tokio::select! {
                        biased;

                        command = commands.recv() => match command {
                            Some(FeedCommand::Action(action)) => {
                                if actions.try_send(action).is_err() {
                                    debug!("Dropping {:?} for offer {}", action, offer_id);
                                }
                            }
                            Some(FeedCommand::Clear) => break Exit::Cleared,
                            Some(FeedCommand::Shutdown) | None => break Exit::Stopped,
                        },
                        outcome = &mut run => break Exit::Resolved(outcome),
                    }
                }
            };

            match exit {
                Exit::Resolved(outcome) => {
                    history.push_back(ResolvedOffer {
                        offer_id,
                        outcome,
                        fare,
                        time_on_screen: countdown.elapsed(),
                        resolved_at: Utc::now(),
                    });
                    while history.len() > config.history_limit {
                        history.pop_front();
                    }
                }
                Exit::Cleared => {
                    info!("Offer {} cleared without an outcome", offer_id);
                    stats.send_modify(|s| s.cleared += 1);
                }
                Exit::Stopped => return finish(&view, &stats, history),
            }
        }
    }
}

/// Callbacks handed to each widget; they keep the session counters current
fn outcome_callbacks(stats: &Arc<watch::Sender<FeedStats>>) -> OfferCallbacks {
    let record = |outcome: Outcome| {
        let stats = Arc::clone(stats);
        move || stats.send_modify(|s| s.record(outcome))
    };

    OfferCallbacks::new(
        record(Outcome::Accepted),
        record(Outcome::Declined),
        record(Outcome::Expired),
    )
}

fn finish(
    view: &watch::Sender<FeedView>,
    stats: &watch::Sender<FeedStats>,
    history: VecDeque<ResolvedOffer>,
) -> FeedReport {
    view.send_replace(FeedView::Blank);
    let stats = *stats.borrow();
    info!(
        "Offer feed stopped: {} offered, {} accepted, {} declined, {} expired",
        stats.offered, stats.accepted, stats.declined, stats.expired
    );

    FeedReport {
        stats,
        history: history.into(),
    }
}
