//! Handbook harvest runtime.
//!
//! Discovers every subject in the handbook listing, fetches its requirements
//! page and turns it into a [`handbook_requisites::SubjectRecord`]. The
//! library is split out from the binary for integration testing.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod harvest;
pub mod progress;
pub mod sink;

pub use acquisition::{FetchError, Fetcher, HarvestError, HarvestResult, HttpClient};
pub use config::{ConfigOverrides, HarvestConfig, PageRange};
pub use harvest::{HarvestReport, Harvester};
