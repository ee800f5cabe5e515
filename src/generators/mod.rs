pub mod mock;
pub mod traits;
pub mod types;

pub use mock::MockOfferGenerator;
pub use traits::OfferSource;
pub use types::{Bounds, GeneratorParams};
