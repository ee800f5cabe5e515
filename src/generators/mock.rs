use crate::generators::traits::OfferSource;
use crate::generators::types::{Bounds, GeneratorParams};
use crate::models::{Eta, Offer, OfferId};
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Shared across generator instances so ids stay unique for the whole process
static NEXT_OFFER_ID: AtomicU64 = AtomicU64::new(1);

const STREETS: &[&str] = &[
    "Rua Augusta",
    "Avenida Paulista",
    "Rua Oscar Freire",
    "Alameda Santos",
    "Rua da Consolação",
    "Avenida Brigadeiro Faria Lima",
    "Rua Haddock Lobo",
    "Rua Bela Cintra",
    "Avenida Rebouças",
    "Rua Teodoro Sampaio",
];

const DISTRICTS: &[&str] = &[
    "Jardins",
    "Pinheiros",
    "Bela Vista",
    "Consolação",
    "Itaim Bibi",
    "Vila Madalena",
];

/// Random offer generator standing in for a dispatch service
pub struct MockOfferGenerator {
    params: GeneratorParams,
    rng: Mutex<StdRng>,
}

impl MockOfferGenerator {
    /// Create a generator with the default ranges
    pub fn new() -> Self {
        Self::with_params(GeneratorParams::default())
    }

    /// Create a generator with custom ranges
    pub fn with_params(params: GeneratorParams) -> Self {
        let params = params.normalized();
        let rng = match params.seed {
            Some(seed) => {
                info!("Seeding mock offer generator with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        Self {
            params,
            rng: Mutex::new(rng),
        }
    }

    /// Build one offer from the generator's RNG
    pub fn generate(&self) -> Offer {
        let id = OfferId(NEXT_OFFER_ID.fetch_add(1, Ordering::Relaxed));

        // A poisoned lock only means another caller panicked mid-sample; the RNG is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let rng = &mut *rng;

        let pickup_address = random_address(rng);
        let mut dropoff_address = random_address(rng);
        while dropoff_address == pickup_address {
            dropoff_address = random_address(rng);
        }

        let pickup_km = sample(rng, self.params.pickup_distance_km, 1);
        let dropoff_km = sample(rng, self.params.dropoff_distance_km, 1);

        let offer = Offer {
            id,
            pickup_address,
            dropoff_address,
            fare: sample(rng, self.params.fare, 2),
            pickup_eta: self.eta_for(pickup_km),
            dropoff_eta: self.eta_for(dropoff_km),
            rider_rating: sample(rng, self.params.rating, 1),
            is_frequent_rider: rng.gen_bool(self.params.frequent_rider_probability),
            created_at: Utc::now(),
        };

        debug!(
            "Generated offer {}: {} -> {} for {:.2}",
            offer.id, offer.pickup_address, offer.dropoff_address, offer.fare
        );

        offer
    }

    fn eta_for(&self, distance_km: f64) -> Eta {
        let minutes = (distance_km * 60.0 / self.params.average_speed_kmh).ceil() as u32;
        Eta {
            minutes: minutes.max(1),
            distance_km,
        }
    }
}

impl Default for MockOfferGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OfferSource for MockOfferGenerator {
    async fn next_offer(&self) -> Offer {
        self.generate()
    }

    fn source_name(&self) -> &'static str {
        "mock"
    }
}

/// Uniform sample rounded to `decimals`, kept inside the bounds after rounding
fn sample(rng: &mut StdRng, bounds: Bounds, decimals: i32) -> f64 {
    let raw = if bounds.min < bounds.max {
        rng.gen_range(bounds.min..=bounds.max)
    } else {
        bounds.min
    };
    let factor = 10f64.powi(decimals);
    ((raw * factor).round() / factor).clamp(bounds.min, bounds.max)
}

fn random_address(rng: &mut StdRng) -> String {
    let street = STREETS[rng.gen_range(0..STREETS.len())];
    let district = DISTRICTS[rng.gen_range(0..DISTRICTS.len())];
    let number = rng.gen_range(1..=1999);
    format!("{}, {} - {}", street, number, district)
}
