use crate::countdown::{Countdown, CountdownView};
use crate::models::{Offer, Outcome};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, info};

/// How often the progress bar is refreshed between whole-second ticks
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(250);

const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);
const ACTION_BUFFER: usize = 8;

/// The two tap targets on the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Accept,
    Decline,
}

type Callback = Box<dyn FnOnce() + Send>;

/// The three outcome callbacks of a widget.
///
/// Firing consumes the whole set, so at most one of them can ever run.
pub struct OfferCallbacks {
    on_accept: Callback,
    on_decline: Callback,
    on_expire: Callback,
}

impl OfferCallbacks {
    pub fn new(
        on_accept: impl FnOnce() + Send + 'static,
        on_decline: impl FnOnce() + Send + 'static,
        on_expire: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            on_accept: Box::new(on_accept),
            on_decline: Box::new(on_decline),
            on_expire: Box::new(on_expire),
        }
    }

    /// Callbacks that do nothing, for owners that only use the returned outcome
    pub fn noop() -> Self {
        Self::new(|| {}, || {}, || {})
    }

    fn fire(self, outcome: Outcome) {
        match outcome {
            Outcome::Accepted => (self.on_accept)(),
            Outcome::Declined => (self.on_decline)(),
            Outcome::Expired => (self.on_expire)(),
        }
    }
}

impl fmt::Debug for OfferCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfferCallbacks").finish_non_exhaustive()
    }
}

/// Card for one offer plus its countdown.
///
/// The widget is a future-driven component: [`RideOfferWidget::run`] owns the
/// tick and frame timers, so dropping the future before it resolves unmounts
/// the widget without firing any callback.
pub struct RideOfferWidget<'a> {
    offer: Offer,
    countdown: &'a mut Countdown,
    actions: mpsc::Receiver<UserAction>,
    frame_interval: Duration,
}

impl<'a> RideOfferWidget<'a> {
    /// Mount `offer`, resetting the shared countdown to its full duration.
    ///
    /// Returns the widget and the sender its tap targets are wired to.
    pub fn mount(
        offer: Offer,
        countdown: &'a mut Countdown,
        frame_interval: Duration,
    ) -> (Self, mpsc::Sender<UserAction>) {
        countdown.reset(offer.id);
        let (tx, rx) = mpsc::channel(ACTION_BUFFER);

        let widget = Self {
            offer,
            countdown,
            actions: rx,
            frame_interval: frame_interval.max(MIN_FRAME_INTERVAL),
        };

        (widget, tx)
    }

    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    pub fn view(&self) -> CountdownView {
        self.countdown.view()
    }

    /// Run the countdown until the first terminal event and fire its callback.
    ///
    /// `render` is called with the current countdown on mount, on every
    /// whole-second tick and on every progress frame.
    pub async fn run<F>(mut self, callbacks: OfferCallbacks, mut render: F) -> Outcome
    where
        F: FnMut(&Offer, CountdownView),
    {
        let started_at = self.countdown.started_at();

        let mut tick = interval_at(started_at + Duration::from_secs(1), Duration::from_secs(1));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frame = interval_at(started_at + self.frame_interval, self.frame_interval);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Offer {} on screen for {}s",
            self.offer.id,
            self.countdown.total().as_secs()
        );
        render(&self.offer, self.countdown.view());

        let mut actions_open = true;
        let outcome = loop {
            tokio::select! {
                biased;

                action = self.actions.recv(), if actions_open => match action {
                    Some(UserAction::Accept) => break Outcome::Accepted,
                    Some(UserAction::Decline) => break Outcome::Declined,
                    None => {
                        debug!("Action channel for offer {} closed", self.offer.id);
                        actions_open = false;
                    }
                },
                _ = tick.tick() => {
                    let view = self.countdown.view();
                    debug!("Offer {}: {}s left", self.offer.id, view.remaining_secs);
                    if view.remaining_secs == 0 {
                        break Outcome::Expired;
                    }
                    render(&self.offer, view);
                }
                _ = frame.tick() => {
                    render(&self.offer, self.countdown.view());
                }
            }
        };

        // Timers stop before the owner hears about the outcome
        drop(tick);
        drop(frame);
        self.actions.close();

        info!(
            "Offer {} {} after {:?}",
            self.offer.id,
            outcome,
            self.countdown.elapsed()
        );
        callbacks.fire(outcome);

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{GeneratorParams, MockOfferGenerator};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{sleep, timeout, Instant};

    #[derive(Clone, Default)]
    struct Counters {
        accepted: Arc<AtomicUsize>,
        declined: Arc<AtomicUsize>,
        expired: Arc<AtomicUsize>,
    }

    impl Counters {
        fn callbacks(&self) -> OfferCallbacks {
            let (a, d, e) = (
                self.accepted.clone(),
                self.declined.clone(),
                self.expired.clone(),
            );
            OfferCallbacks::new(
                move || {
                    a.fetch_add(1, Ordering::SeqCst);
                },
                move || {
                    d.fetch_add(1, Ordering::SeqCst);
                },
                move || {
                    e.fetch_add(1, Ordering::SeqCst);
                },
            )
        }

        fn snapshot(&self) -> (usize, usize, usize) {
            (
                self.accepted.load(Ordering::SeqCst),
                self.declined.load(Ordering::SeqCst),
                self.expired.load(Ordering::SeqCst),
            )
        }
    }

    fn offer() -> Offer {
        MockOfferGenerator::with_params(GeneratorParams {
            seed: Some(21),
            ..GeneratorParams::default()
        })
        .generate()
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_exactly_the_configured_duration() {
        for secs in [1, 2, 5, 10] {
            let counters = Counters::default();
            let mut countdown = Countdown::from_secs(secs);
            let mounted_at = Instant::now();

            let (widget, _tx) = RideOfferWidget::mount(offer(), &mut countdown, DEFAULT_FRAME_INTERVAL);
            let outcome = widget.run(counters.callbacks(), |_, _| {}).await;

            assert_eq!(outcome, Outcome::Expired);
            assert_eq!(mounted_at.elapsed(), Duration::from_secs(secs));
            assert_eq!(counters.snapshot(), (0, 0, 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn accept_before_expiry_fires_only_accept() {
        let counters = Counters::default();
        let mut countdown = Countdown::from_secs(10);
        let renders = Arc::new(AtomicUsize::new(0));
        let render_count = renders.clone();

        let (widget, tx) = RideOfferWidget::mount(offer(), &mut countdown, DEFAULT_FRAME_INTERVAL);
        let (outcome, _) = tokio::join!(
            widget.run(counters.callbacks(), move |_, _| {
                render_count.fetch_add(1, Ordering::SeqCst);
            }),
            async {
                sleep(Duration::from_secs(3)).await;
                tx.send(UserAction::Accept).await.unwrap();
                // A second tap after the outcome goes nowhere
                let _ = tx.send(UserAction::Decline).await;
            }
        );

        assert_eq!(outcome, Outcome::Accepted);
        assert_eq!(countdown.elapsed(), Duration::from_secs(3));

        let renders_at_outcome = renders.load(Ordering::SeqCst);
        sleep(Duration::from_secs(20)).await;
        assert_eq!(counters.snapshot(), (1, 0, 0));
        assert_eq!(renders.load(Ordering::SeqCst), renders_at_outcome);
    }

    #[tokio::test(start_paused = true)]
    async fn decline_before_expiry_fires_only_decline() {
        let counters = Counters::default();
        let mut countdown = Countdown::from_secs(5);

        let (widget, tx) = RideOfferWidget::mount(offer(), &mut countdown, DEFAULT_FRAME_INTERVAL);
        let (outcome, _) = tokio::join!(widget.run(counters.callbacks(), |_, _| {}), async {
            sleep(Duration::from_millis(4200)).await;
            tx.send(UserAction::Decline).await.unwrap();
        });

        assert_eq!(outcome, Outcome::Declined);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(counters.snapshot(), (0, 1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn unmounting_fires_nothing() {
        let counters = Counters::default();
        let mut countdown = Countdown::from_secs(5);
        let renders = Arc::new(AtomicUsize::new(0));
        let render_count = renders.clone();

        let (widget, tx) = RideOfferWidget::mount(offer(), &mut countdown, DEFAULT_FRAME_INTERVAL);
        let run = widget.run(counters.callbacks(), move |_, _| {
            render_count.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timeout(Duration::from_secs(3), run).await.is_err());

        let renders_at_unmount = renders.load(Ordering::SeqCst);
        assert!(tx.send(UserAction::Accept).await.is_err());
        sleep(Duration::from_secs(30)).await;

        assert_eq!(counters.snapshot(), (0, 0, 0));
        assert_eq!(renders.load(Ordering::SeqCst), renders_at_unmount);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_action_channel_still_expires() {
        let counters = Counters::default();
        let mut countdown = Countdown::from_secs(2);

        let (widget, tx) = RideOfferWidget::mount(offer(), &mut countdown, DEFAULT_FRAME_INTERVAL);
        drop(tx);
        let outcome = widget.run(counters.callbacks(), |_, _| {}).await;

        assert_eq!(outcome, Outcome::Expired);
        assert_eq!(counters.snapshot(), (0, 0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn renders_count_down_from_full() {
        let mut countdown = Countdown::from_secs(3);
        let mut views = Vec::new();

        let (widget, _tx) = RideOfferWidget::mount(offer(), &mut countdown, Duration::from_millis(500));
        widget
            .run(OfferCallbacks::noop(), |_, view| views.push(view))
            .await;

        let first = views.first().copied().unwrap();
        assert_eq!(first.remaining_secs, 3);
        assert_eq!(first.remaining_fraction, 1.0);
        for pair in views.windows(2) {
            assert!(pair[1].remaining_secs <= pair[0].remaining_secs);
            assert!(pair[1].remaining_fraction <= pair[0].remaining_fraction);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn mount_resets_shared_countdown_to_offer() {
        let mut countdown = Countdown::from_secs(4);
        let offer = offer();
        let id = offer.id;

        sleep(Duration::from_secs(9)).await;
        let (widget, _tx) = RideOfferWidget::mount(offer, &mut countdown, DEFAULT_FRAME_INTERVAL);
        assert_eq!(widget.offer().id, id);
        assert_eq!(widget.view().remaining_secs, 4);
        drop(widget);
        assert_eq!(countdown.elapsed(), Duration::ZERO);
    }
}
