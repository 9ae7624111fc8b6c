//! Network side of the harvest: fetching documents, reading the paginated
//! subject listing and finding each subject's requirements page.

pub mod error;
pub mod http_client;
pub mod listing;
pub mod locator;

pub use error::{FetchError, FetchErrorKind, HarvestError, HarvestResult};
pub use http_client::{Fetcher, HttpClient};
pub use listing::ListingDiscoverer;
pub use locator::RequirementLocator;
