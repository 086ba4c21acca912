use super::{HttpClient, ProviderFetcher};
use crate::core::errors::{Error, Result};
use crate::core::json;
use crate::core::network_prefix::{NetworkPrefix, PrefixSet};
use crate::core::provider::ProviderId;

/*-------------------------------------------------------------------------------------------------
  Google Cloud Fetcher
-------------------------------------------------------------------------------------------------*/

#[derive(Debug, Clone)]
pub struct GcpFetcher {
    http: HttpClient,
    url: String,
}

impl GcpFetcher {
    pub fn new(http: HttpClient, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

impl ProviderFetcher for GcpFetcher {
    fn fetch(&self) -> Result<PrefixSet> {
        let body = self.http.get_text(ProviderId::Gcp, &self.url)?;
        extract_prefixes(&body)
    }
}

fn extract_prefixes(body: &str) -> Result<PrefixSet> {
    let ranges = json::parse_gcp(body).map_err(|error| Error::fetch(ProviderId::Gcp, error))?;

    Ok(ranges
        .prefixes
        .iter()
        .filter_map(json::GcpJsonIpPrefix::prefix)
        .map(NetworkPrefix::from)
        .collect())
}
