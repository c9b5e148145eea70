pub mod montreal;

pub use montreal::MontrealRinksCrawler;

use crate::common::error::Result;

/// Something that can hand back the rink conditions page.
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    /// Identifier used in logs.
    fn source_name(&self) -> &'static str;

    /// Fetch the raw HTML listing.
    async fn fetch_listing(&self) -> Result<String>;
}
