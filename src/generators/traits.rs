use crate::models::Offer;
use async_trait::async_trait;

/// Common trait for anything that can hand the feed its next ride offer
/// The mock generator lives behind it so a dispatch service can replace it later
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// Produce the next offer. Every call returns a fresh, larger id.
    async fn next_offer(&self) -> Offer;

    /// Get the name of the offer source
    fn source_name(&self) -> &'static str;
}
