use crate::apis::ListingSource;
use crate::common::error::{Result, ScraperError};
use tracing::{info, instrument};

/// Downloads the City of Montréal outdoor rink conditions page.
pub struct MontrealRinksCrawler {
    client: reqwest::Client,
    url: String,
}

impl MontrealRinksCrawler {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl ListingSource for MontrealRinksCrawler {
    fn source_name(&self) -> &'static str {
        "montreal_rinks"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_listing(&self) -> Result<String> {
        info!("Fetching rink data from Montreal website...");
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(ScraperError::Api {
                message: format!("Rink listing request failed with status: {}", response.status()),
            });
        }
        let body = response.text().await?;
        info!("Fetched listing ({} bytes)", body.len());
        Ok(body)
    }
}
