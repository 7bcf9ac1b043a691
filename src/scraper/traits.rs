use crate::model::ScraperError;

#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    /// Downloads the HTML of a listing page.
    async fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}
