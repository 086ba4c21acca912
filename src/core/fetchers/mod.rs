/*-------------------------------------------------------------------------------------------------
  Provider Fetchers
-------------------------------------------------------------------------------------------------*/

mod aws;
mod azure;
mod gcp;
mod http;

pub use aws::AwsFetcher;
pub use azure::AzureFetcher;
pub use gcp::GcpFetcher;
pub use http::HttpClient;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::core::network_prefix::PrefixSet;
use crate::core::provider::ProviderId;
use std::collections::HashMap;
use std::sync::Arc;

/*--------------------------------------------------------------------------------------
  Provider Fetcher Interface
--------------------------------------------------------------------------------------*/

/// Retrieves the current published prefixes for one provider.
///
/// `fetch` blocks on network I/O. Transport, status, and schema problems are reported as
/// [crate::Error::Fetch]; they are consumed by the registry and never reach query callers.
pub trait ProviderFetcher: Send + Sync {
    fn fetch(&self) -> Result<PrefixSet>;
}

/*--------------------------------------------------------------------------------------
  Fetcher Dispatch Table
--------------------------------------------------------------------------------------*/

/// Fixed mapping from provider to the capability that fetches its ranges.
#[derive(Clone, Default)]
pub struct FetcherTable {
    fetchers: HashMap<ProviderId, Arc<dyn ProviderFetcher>>,
}

impl FetcherTable {
    /// An empty table; every refresh attempt fails until fetchers are installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// The HTTP fetchers for every [ProviderId].
    pub fn standard(config: &Config) -> Self {
        let http = HttpClient::new(config);
        Self::new()
            .with(ProviderId::Aws, AwsFetcher::new(http.clone(), config.aws_url()))
            .with(ProviderId::Gcp, GcpFetcher::new(http.clone(), config.gcp_url()))
            .with(
                ProviderId::Azure,
                AzureFetcher::new(http, config.azure_details_url()),
            )
    }

    /// Install (or replace) the fetcher for `provider`.
    pub fn with<F: ProviderFetcher + 'static>(mut self, provider: ProviderId, fetcher: F) -> Self {
        self.fetchers.insert(provider, Arc::new(fetcher));
        self
    }

    pub fn get(&self, provider: ProviderId) -> Option<Arc<dyn ProviderFetcher>> {
        self.fetchers.get(&provider).cloned()
    }
}

impl std::fmt::Debug for FetcherTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<&ProviderId> = self.fetchers.keys().collect();
        providers.sort();
        f.debug_struct("FetcherTable")
            .field("providers", &providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_standard_table_covers_every_provider() {
        let table = FetcherTable::standard(&Config::default());
        for provider in ProviderId::ALL {
            assert!(table.get(provider).is_some(), "missing {provider}");
        }
        assert!(FetcherTable::new().get(ProviderId::Aws).is_none());
    }
}
