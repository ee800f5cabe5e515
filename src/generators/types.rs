use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inclusive numeric range used by the mock generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Swap inverted ends and drop negative values
    fn normalized(self, name: &str) -> Self {
        let (mut min, mut max) = (self.min, self.max);
        if !min.is_finite() || !max.is_finite() {
            warn!("{} range is not finite, using 0..=0", name);
            return Self::new(0.0, 0.0);
        }
        if min > max {
            warn!("{} range is inverted ({} > {}), swapping", name, min, max);
            std::mem::swap(&mut min, &mut max);
        }
        if min < 0.0 {
            warn!("{} range starts below zero, clamping to 0", name);
            min = 0.0;
            max = max.max(0.0);
        }
        Self::new(min, max)
    }
}

/// Parameters for mock offer generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Fare in currency units
    pub fare: Bounds,
    /// Rider rating, at most 5 stars
    pub rating: Bounds,
    /// Distance from the driver to the pickup point (km)
    pub pickup_distance_km: Bounds,
    /// Distance from pickup to dropoff (km)
    pub dropoff_distance_km: Bounds,
    /// Used to turn distances into minutes
    pub average_speed_kmh: f64,
    /// Chance that an offer is flagged as a frequent rider
    pub frequent_rider_probability: f64,
    /// Fixed RNG seed for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            fare: Bounds::new(8.0, 38.0),
            rating: Bounds::new(3.5, 5.0),
            pickup_distance_km: Bounds::new(1.0, 5.0),
            dropoff_distance_km: Bounds::new(1.0, 11.0),
            average_speed_kmh: 30.0,
            frequent_rider_probability: 0.3,
            seed: None,
        }
    }
}

impl GeneratorParams {
    /// Clamp everything into a range the generator can sample from
    pub fn normalized(self) -> Self {
        let mut rating = self.rating.normalized("rating");
        if rating.max > 5.0 {
            warn!("rating range exceeds 5 stars, clamping");
            rating.max = 5.0;
            rating.min = rating.min.min(5.0);
        }

        let average_speed_kmh = if self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0 {
            self.average_speed_kmh
        } else {
            warn!(
                "average speed {} km/h is not usable, falling back to 30",
                self.average_speed_kmh
            );
            30.0
        };

        let frequent_rider_probability = if self.frequent_rider_probability.is_finite() {
            self.frequent_rider_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            fare: self.fare.normalized("fare"),
            rating,
            pickup_distance_km: self.pickup_distance_km.normalized("pickup distance"),
            dropoff_distance_km: self.dropoff_distance_km.normalized("dropoff distance"),
            average_speed_kmh,
            frequent_rider_probability,
            seed: self.seed,
        }
    }
}
