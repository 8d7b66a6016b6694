//! Article scraping.
//!
//! Each catalogue entry is fetched and reduced to clean, sentence-delimited
//! text ready for narration. Scraping follows a two-step pattern:
//!
//! 1. **Fetching**: Download the article page with `reqwest`
//! 2. **Extraction**: Collect visible text with `scraper` and normalize it
//!
//! Failed fetches are logged and skipped by the caller without failing the
//! rest of the catalogue.

pub mod article;
