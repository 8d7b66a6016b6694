//! Output generation for the episode ledger and the podcast feed.
//!
//! # Submodules
//!
//! - [`json`]: Persists every published episode to `episodes.json`
//! - [`feed`]: Renders the RSS 2.0 feed with iTunes extensions
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── how_to_do_great_work.mp3
//! ├── do_things_that_dont_scale.mp3
//! ├── episodes.json   # ledger, so later runs append instead of replace
//! └── feed.xml
//! ```

pub mod feed;
pub mod json;
