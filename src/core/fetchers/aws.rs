use super::{HttpClient, ProviderFetcher};
use crate::core::errors::{Error, Result};
use crate::core::json;
use crate::core::network_prefix::{NetworkPrefix, PrefixSet};
use crate::core::provider::ProviderId;
use ipnetwork::IpNetwork;

/*-------------------------------------------------------------------------------------------------
  AWS Fetcher
-------------------------------------------------------------------------------------------------*/

/// Only the `AMAZON` service is kept; it is the superset of every other AWS service's prefixes.
const AWS_SERVICE: &str = "AMAZON";

#[derive(Debug, Clone)]
pub struct AwsFetcher {
    http: HttpClient,
    url: String,
}

impl AwsFetcher {
    pub fn new(http: HttpClient, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

impl ProviderFetcher for AwsFetcher {
    fn fetch(&self) -> Result<PrefixSet> {
        let body = self.http.get_text(ProviderId::Aws, &self.url)?;
        extract_prefixes(&body)
    }
}

fn extract_prefixes(body: &str) -> Result<PrefixSet> {
    let ranges = json::parse_aws(body).map_err(|error| Error::fetch(ProviderId::Aws, error))?;

    let ipv4 = ranges
        .prefixes
        .iter()
        .filter(|prefix| prefix.service == AWS_SERVICE)
        .map(|prefix| IpNetwork::V4(prefix.ip_prefix));
    let ipv6 = ranges
        .ipv6_prefixes
        .iter()
        .filter(|prefix| prefix.service == AWS_SERVICE)
        .map(|prefix| IpNetwork::V6(prefix.ipv6_prefix));

    Ok(ipv4.chain(ipv6).map(NetworkPrefix::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;
    use crate::core::json::tests::AWS_TEST_JSON;
    use crate::core::network_prefix::tests::prefix_set;

    #[test]
    fn test_extract_prefixes_keeps_amazon_service_only() {
        let prefixes = extract_prefixes(AWS_TEST_JSON).unwrap();
        assert_eq!(prefixes, prefix_set(&["10.0.0.0/8", "2001:db8::/32"]));
    }

    #[test]
    fn test_extract_prefixes_reports_malformed_json() {
        let error = extract_prefixes("<html>maintenance</html>").unwrap_err();
        assert!(matches!(
            error,
            Error::Fetch {
                provider: ProviderId::Aws,
                ..
            }
        ));
    }
}
