use crate::core::errors::{Error, Result};
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/*-------------------------------------------------------------------------------------------------
  Network Prefix
-------------------------------------------------------------------------------------------------*/

/// Immutable IPv4 or IPv6 CIDR block. Host bits are cleared on construction, so `10.1.2.3/8` and
/// `10.0.0.0/8` are the same prefix.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NetworkPrefix(IpNetwork);

impl NetworkPrefix {
    pub fn new(network: IpNetwork) -> Self {
        // The network address and prefix length of an existing IpNetwork are always valid.
        let normalized = match network {
            IpNetwork::V4(v4) => Ipv4Network::new(v4.network(), v4.prefix()).map(IpNetwork::V4),
            IpNetwork::V6(v6) => Ipv6Network::new(v6.network(), v6.prefix()).map(IpNetwork::V6),
        };
        Self(normalized.unwrap_or(network))
    }

    /// Whether `address` falls inside this prefix. Addresses of the other family never match.
    pub fn contains(&self, address: IpAddr) -> bool {
        self.0.contains(address)
    }

    pub fn network(&self) -> IpNetwork {
        self.0
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix()
    }

    pub fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }

    pub fn is_ipv6(&self) -> bool {
        self.0.is_ipv6()
    }
}

impl From<IpNetwork> for NetworkPrefix {
    fn from(network: IpNetwork) -> Self {
        Self::new(network)
    }
}

impl FromStr for NetworkPrefix {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Ok(Self::new(value.trim().parse::<IpNetwork>()?))
    }
}

impl fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.network(), self.0.prefix())
    }
}

/*-------------------------------------------------------------------------------------------------
  Prefix Set
-------------------------------------------------------------------------------------------------*/

/// All prefixes published by one provider.
pub type PrefixSet = BTreeSet<NetworkPrefix>;

/// The prefix of `set` that contains `address` with the most mask bits.
///
/// Probes the set with each covering prefix of `address`, longest first, so the cost depends on
/// the address width rather than the size of the set.
pub fn longest_match(set: &PrefixSet, address: IpAddr) -> Option<NetworkPrefix> {
    let max_len: u8 = if address.is_ipv4() { 32 } else { 128 };
    (0..=max_len)
        .rev()
        .filter_map(|len| IpNetwork::new(address, len).ok().map(NetworkPrefix::new))
        .find(|candidate| set.contains(candidate))
}

/// Cache value encoding: CIDR strings joined with `,`.
pub fn encode_prefix_set(prefixes: &PrefixSet) -> String {
    prefixes
        .iter()
        .map(NetworkPrefix::to_string)
        .collect::<Vec<String>>()
        .join(",")
}

/// Decode a cache value produced by [encode_prefix_set]. Any malformed CIDR rejects the whole
/// value; empty segments are skipped.
pub fn decode_prefix_set(value: &str) -> Result<PrefixSet> {
    value
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .parse::<NetworkPrefix>()
                .map_err(|error| Error::InvalidInput(format!("{segment:?}: {error}")))
        })
        .collect()
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_log::test;

    /*----------------------------------------------------------------------------------
      Test Helper Functions
    ----------------------------------------------------------------------------------*/

    pub(crate) fn prefix_set(cidrs: &[&str]) -> PrefixSet {
        cidrs.iter().map(|cidr| cidr.parse().unwrap()).collect()
    }

    /*----------------------------------------------------------------------------------
      NetworkPrefix
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_network_prefix_contains() {
        let prefix: NetworkPrefix = "10.0.0.0/8".parse().unwrap();
        assert!(prefix.contains("10.1.2.3".parse().unwrap()));
        assert!(!prefix.contains("11.0.0.1".parse().unwrap()));
        assert!(!prefix.contains("::ffff:10.1.2.3".parse().unwrap()));

        let prefix: NetworkPrefix = "2001:db8::/32".parse().unwrap();
        assert!(prefix.contains("2001:db8:1::1".parse().unwrap()));
        assert!(!prefix.contains("2001:db9::1".parse().unwrap()));
    }

    #[test]
    fn test_network_prefix_clears_host_bits() {
        let prefix: NetworkPrefix = "10.1.2.3/8".parse().unwrap();
        assert_eq!(prefix.to_string(), "10.0.0.0/8");
        assert_eq!(prefix, "10.0.0.0/8".parse().unwrap());
        assert_eq!(prefix.prefix_len(), 8);
    }

    #[test]
    fn test_network_prefix_rejects_garbage() {
        assert!("not-a-prefix".parse::<NetworkPrefix>().is_err());
        assert!("10.0.0.0/33".parse::<NetworkPrefix>().is_err());
    }

    #[test]
    fn test_longest_match() {
        let set = prefix_set(&["0.0.0.0/0", "10.0.0.0/8", "10.1.0.0/16", "2001:db8::/32"]);

        let found = |address: &str| longest_match(&set, address.parse().unwrap());
        assert_eq!(found("10.1.2.3"), Some("10.1.0.0/16".parse().unwrap()));
        assert_eq!(found("10.2.0.1"), Some("10.0.0.0/8".parse().unwrap()));
        assert_eq!(found("8.8.8.8"), Some("0.0.0.0/0".parse().unwrap()));
        assert_eq!(found("2001:db8::1"), Some("2001:db8::/32".parse().unwrap()));
        assert_eq!(found("2001:db9::1"), None);
    }

    /*----------------------------------------------------------------------------------
      Cache Encoding
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_prefix_set_cache_encoding() {
        let prefixes = prefix_set(&["52.0.0.0/8", "10.0.0.0/8", "2600:1f00::/24"]);
        let encoded = encode_prefix_set(&prefixes);
        assert_eq!(encoded, "10.0.0.0/8,52.0.0.0/8,2600:1f00::/24");
        assert_eq!(decode_prefix_set(&encoded).unwrap(), prefixes);

        // Order of the encoded entries does not matter.
        let reordered = decode_prefix_set("2600:1f00::/24, 52.0.0.0/8,10.0.0.0/8").unwrap();
        assert_eq!(reordered, prefixes);
    }

    #[test]
    fn test_decode_prefix_set_rejects_malformed_entries() {
        assert!(decode_prefix_set("10.0.0.0/8,bogus").is_err());
        assert!(decode_prefix_set("").unwrap().is_empty());
    }
}
