use crate::cli::core::IpMatch;
use log::{info, warn};

/*-------------------------------------------------------------------------------------------------
  Logging Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  IP Check Results
--------------------------------------------------------------------------------------*/

pub fn ip_matches(ip_matches: &[IpMatch]) {
    if ip_matches.is_empty() {
        return;
    }

    let count_checked = ip_matches.len();
    info!("Checked {count_checked} IP address(es) against the cloud IP ranges");

    let count_found = ip_matches.iter().filter(|m| m.is_cloud_ip()).count();
    if count_found > 0 {
        info!("Found {count_found} cloud IP address(es)");
    };

    let count_not_found = count_checked - count_found;
    if count_not_found > 0 {
        warn!("Did not find {count_not_found} IP address(es) in the cloud IP ranges");
    };
}
