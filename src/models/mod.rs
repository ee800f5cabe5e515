use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifier of a generated offer, strictly increasing within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferId(pub u64);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Estimated travel leg, shown as "<n> min (<d.d> km)"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Eta {
    pub minutes: u32,
    pub distance_km: f64,
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min ({:.1} km)", self.minutes, self.distance_km)
    }
}

/// A single ride request shown to the driver.
///
/// Offers are never updated in place: the next offer replaces the current
/// one wholesale and always carries a new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub fare: f64,
    pub pickup_eta: Eta,
    pub dropoff_eta: Eta,
    pub rider_rating: f64,
    pub is_frequent_rider: bool,
    pub created_at: DateTime<Utc>,
}

/// How an offer left the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Accepted,
    Declined,
    Expired,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Accepted => "accepted",
            Outcome::Declined => "declined",
            Outcome::Expired => "expired",
        };
        f.write_str(label)
    }
}

/// Record of an offer after a terminal outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedOffer {
    pub offer_id: OfferId,
    pub outcome: Outcome,
    pub fare: f64,
    #[serde(with = "duration_ms")]
    pub time_on_screen: Duration,
    pub resolved_at: DateTime<Utc>,
}

/// Running counters for a feed session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    pub offered: u64,
    pub accepted: u64,
    pub declined: u64,
    pub expired: u64,
    /// Offers removed by the owner before any outcome
    pub cleared: u64,
}

impl FeedStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Accepted => self.accepted += 1,
            Outcome::Declined => self.declined += 1,
            Outcome::Expired => self.expired += 1,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_display_combines_duration_and_distance() {
        let eta = Eta {
            minutes: 7,
            distance_km: 3.46,
        };
        assert_eq!(eta.to_string(), "7 min (3.5 km)");
    }

    #[test]
    fn stats_count_each_outcome() {
        let mut stats = FeedStats::default();
        stats.record(Outcome::Accepted);
        stats.record(Outcome::Expired);
        stats.record(Outcome::Expired);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.declined, 0);
        assert_eq!(stats.expired, 2);
    }

    #[test]
    fn resolved_offer_serializes_time_on_screen_as_millis() {
        let record = ResolvedOffer {
            offer_id: OfferId(4),
            outcome: Outcome::Declined,
            fare: 12.5,
            time_on_screen: Duration::from_millis(3250),
            resolved_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["time_on_screen"], 3250);
        assert_eq!(json["outcome"], "Declined");
    }
}
