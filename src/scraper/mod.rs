pub mod fetcher;
pub mod traits;

pub use fetcher::HttpScraper;
pub use traits::Scraper;
