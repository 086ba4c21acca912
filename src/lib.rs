//! Check whether IP addresses belong to the published IP ranges of the major public clouds
//! (AWS, Google Cloud, and Azure).
//!
//! The [CloudRangeRegistry] holds each provider's current prefixes, refreshes them directly from
//! the providers or through a [RangeCache], and answers membership queries from any number of
//! threads while refreshes are in progress.
//!
//! ```no_run
//! use cloudipranges::{CloudRangeRegistry, Config, FetcherTable, MemoryCache, ProviderId};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let config = Config::new();
//! let registry = CloudRangeRegistry::new(FetcherTable::standard(&config), &config);
//! registry
//!     .attach_cache(Arc::new(MemoryCache::new()), &ProviderId::ALL)
//!     .await;
//!
//! if registry.is_cloud_ip("3.141.102.225", &[ProviderId::Aws]) {
//!     println!("AWS");
//! }
//! # }
//! ```

mod core;

/*-------------------------------------------------------------------------------------------------
  Library Interface
-------------------------------------------------------------------------------------------------*/

pub use crate::core::cache::{
    CacheError, CacheResult, FileCache, MemoryCache, RangeCache, CACHE_NAMESPACE,
};
pub use crate::core::config::{Config, ConfigBuilder};
pub use crate::core::errors::{Error, Result};
pub use crate::core::fetchers::{
    AwsFetcher, AzureFetcher, FetcherTable, GcpFetcher, HttpClient, ProviderFetcher,
};
pub use crate::core::network_prefix::{
    decode_prefix_set, encode_prefix_set, NetworkPrefix, PrefixSet,
};
pub use crate::core::provider::ProviderId;
pub use crate::core::registry::{parse_ip, CloudRangeRegistry, RangeSnapshot, RangeSource};

// Re-export ipnetwork so callers can build prefixes without a direct dependency.
pub use ipnetwork;
