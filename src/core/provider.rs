use crate::core::errors::{Error, Result};
use std::fmt;
use std::str::FromStr;

/*-------------------------------------------------------------------------------------------------
  Provider Identifier
-------------------------------------------------------------------------------------------------*/

/// Public-cloud provider whose published IP ranges are tracked by the registry.
///
/// The set of providers is closed; supporting a new one means adding a variant here and a fetcher
/// entry in [crate::FetcherTable::standard].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ProviderId {
    Aws,
    Gcp,
    Azure,
}

impl ProviderId {
    /// Every supported provider; the default provider selection for refreshes and queries.
    pub const ALL: [ProviderId; 3] = [ProviderId::Aws, ProviderId::Gcp, ProviderId::Azure];

    /// Case-sensitive identifier used in cache keys and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Aws => "AWS",
            ProviderId::Gcp => "GCP",
            ProviderId::Azure => "Azure",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        ProviderId::ALL
            .into_iter()
            .find(|provider| provider.as_str() == value)
            .ok_or_else(|| Error::InvalidInput(format!("unknown provider: {value:?}")))
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_provider_id_round_trip_through_text() {
        for provider in ProviderId::ALL {
            assert_eq!(provider.to_string().parse::<ProviderId>().unwrap(), provider);
        }
    }

    #[test]
    fn test_provider_id_is_case_sensitive() {
        assert!("aws".parse::<ProviderId>().is_err());
        assert!("AZURE".parse::<ProviderId>().is_err());
        assert_eq!("Azure".parse::<ProviderId>().unwrap(), ProviderId::Azure);
    }
}
