//! One scrape cycle: every source run concurrently under a shared deadline.

mod orchestrator;
mod session;

pub use orchestrator::{DEFAULT_SCRAPE_DEADLINE, ScrapeOutcome, ScrapeResult, Scraper};
pub use session::{SampleBuffer, SampleSink, ScrapeSession};
