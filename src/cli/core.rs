use cloudipranges::{CloudRangeRegistry, NetworkPrefix, ProviderId};
use log::error;
use std::net::IpAddr;

/*-------------------------------------------------------------------------------------------------
  Core functions
-------------------------------------------------------------------------------------------------*/

/// Outcome of checking one command line IP argument.
#[derive(Debug)]
pub struct IpMatch {
    pub input: String,
    pub address: Option<IpAddr>,
    pub matches: Vec<(ProviderId, NetworkPrefix)>,
}

impl IpMatch {
    pub fn is_cloud_ip(&self) -> bool {
        !self.matches.is_empty()
    }
}

/*--------------------------------------------------------------------------------------
  Check IP addresses from CLI arguments
--------------------------------------------------------------------------------------*/

pub fn check_ips(
    registry: &CloudRangeRegistry,
    ips: &[String],
    providers: &[ProviderId],
) -> Vec<IpMatch> {
    ips.iter()
        .map(|ip| {
            let address = cloudipranges::parse_ip(ip)
                .inspect_err(|error| error!("{error}"))
                .ok();
            let matches = address
                .map(|address| registry.matching_providers(address, providers))
                .unwrap_or_default();
            IpMatch {
                input: ip.clone(),
                address,
                matches,
            }
        })
        .collect()
}
