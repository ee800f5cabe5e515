use crate::countdown::CountdownView;
use crate::feed::FeedReport;
use crate::models::{Offer, Outcome};

const BAR_WIDTH: usize = 20;

/// Plain-text version of the ride request card
pub fn offer_card(offer: &Offer) -> String {
    let mut lines = Vec::new();
    lines.push(format!("🚕 New ride request {}", offer.id));

    let badge = if offer.is_frequent_rider { "  · frequent rider" } else { "" };
    lines.push(format!("   ★ {:.1}{}", offer.rider_rating, badge));

    lines.push(format!("   Fare: $ {:.2}", offer.fare));
    lines.push(format!("   Pickup:  {} · {}", offer.pickup_address, offer.pickup_eta));
    lines.push(format!("   Dropoff: {} · {}", offer.dropoff_address, offer.dropoff_eta));
    lines.push("   [a] accept   [d] decline".to_string());

    lines.join("\n")
}

/// Countdown line drawn under the card
pub fn progress_line(view: &CountdownView) -> String {
    let filled = (view.remaining_fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "   [{}{}] {:>2}s",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        view.remaining_secs
    )
}

pub fn searching() -> &'static str {
    "🔎 Searching for rides..."
}

pub fn session_summary(report: &FeedReport) -> String {
    let stats = &report.stats;
    let mut lines = vec![
        format!("Offers shown: {}", stats.offered),
        format!("   accepted: {}", stats.accepted),
        format!("   declined: {}", stats.declined),
        format!("   expired:  {}", stats.expired),
    ];
    if stats.cleared > 0 {
        lines.push(format!("   cleared:  {}", stats.cleared));
    }

    let earned: f64 = report
        .history
        .iter()
        .filter(|r| r.outcome == Outcome::Accepted)
        .map(|r| r.fare)
        .sum();
    lines.push(format!("Accepted fares (last {}): $ {:.2}", report.history.len(), earned));

    lines.join("\n")
}
