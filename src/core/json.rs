use crate::core::errors::Result;
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use serde::{Deserialize, Serialize};

/*-------------------------------------------------------------------------------------------------
  Parse JSON
-------------------------------------------------------------------------------------------------*/

pub fn parse_aws(json: &str) -> Result<AwsJsonIpRanges<'_>> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_gcp(json: &str) -> Result<GcpJsonIpRanges> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_azure(json: &str) -> Result<AzureJsonServiceTags> {
    Ok(serde_json::from_str(json)?)
}

/*-------------------------------------------------------------------------------------------------
  AWS JSON Data Structures
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  AWS IP Ranges (ip-ranges.json)
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AwsJsonIpRanges<'j> {
    #[serde(rename = "syncToken")]
    pub sync_token: &'j str,

    pub prefixes: Vec<AwsJsonIpPrefix<'j>>,

    #[serde(default)]
    pub ipv6_prefixes: Vec<AwsJsonIpv6Prefix<'j>>,
}

#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AwsJsonIpPrefix<'j> {
    pub ip_prefix: Ipv4Network,
    pub region: &'j str,
    pub network_border_group: &'j str,
    pub service: &'j str,
}

#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AwsJsonIpv6Prefix<'j> {
    pub ipv6_prefix: Ipv6Network,
    pub region: &'j str,
    pub network_border_group: &'j str,
    pub service: &'j str,
}

/*-------------------------------------------------------------------------------------------------
  GCP JSON Data Structures
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Google Cloud IP Ranges (cloud.json)
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpJsonIpRanges {
    #[serde(default)]
    pub sync_token: Option<String>,

    pub prefixes: Vec<GcpJsonIpPrefix>,
}

/// Each entry carries exactly one of the two address-family fields.
#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpJsonIpPrefix {
    #[serde(default)]
    pub ipv4_prefix: Option<Ipv4Network>,

    #[serde(default)]
    pub ipv6_prefix: Option<Ipv6Network>,

    #[serde(default)]
    pub service: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

impl GcpJsonIpPrefix {
    pub fn prefix(&self) -> Option<IpNetwork> {
        self.ipv4_prefix
            .map(IpNetwork::V4)
            .or(self.ipv6_prefix.map(IpNetwork::V6))
    }
}

/*-------------------------------------------------------------------------------------------------
  Azure JSON Data Structures
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Azure Service Tags (ServiceTags_Public_*.json)
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureJsonServiceTags {
    #[serde(default)]
    pub change_number: Option<u64>,

    #[serde(default)]
    pub cloud: Option<String>,

    pub values: Vec<AzureJsonServiceTag>,
}

#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AzureJsonServiceTag {
    pub name: String,
    pub properties: AzureJsonServiceTagProperties,
}

#[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureJsonServiceTagProperties {
    pub address_prefixes: Vec<IpNetwork>,
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_log::test;

    pub(crate) const AWS_TEST_JSON: &str = r#"{
      "syncToken": "1640995200",
      "createDate": "2022-01-01-00-00-00",
      "prefixes": [
        {
          "ip_prefix": "10.0.0.0/8",
          "region": "us-east-1",
          "network_border_group": "us-east-1",
          "service": "AMAZON"
        },
        {
          "ip_prefix": "10.0.0.0/16",
          "region": "us-east-1",
          "network_border_group": "us-east-1",
          "service": "EC2"
        },
        {
          "ip_prefix": "52.95.0.0/16",
          "region": "us-west-2",
          "network_border_group": "us-west-2",
          "service": "S3"
        }
      ],
      "ipv6_prefixes": [
        {
          "ipv6_prefix": "2001:db8::/32",
          "region": "us-east-1",
          "network_border_group": "us-east-1",
          "service": "AMAZON"
        }
      ]
    }"#;

    pub(crate) const GCP_TEST_JSON: &str = r#"{
      "syncToken": "1700000000000",
      "creationTime": "2023-11-14T22:13:20.000000",
      "prefixes": [
        { "ipv4Prefix": "34.1.208.0/20", "service": "Google Cloud", "scope": "africa-south1" },
        { "ipv6Prefix": "2600:1900:8000::/44", "service": "Google Cloud", "scope": "us-east1" }
      ]
    }"#;

    pub(crate) const AZURE_TEST_JSON: &str = r#"{
      "changeNumber": 290,
      "cloud": "Public",
      "values": [
        {
          "name": "ActionGroup",
          "id": "ActionGroup",
          "properties": {
            "changeNumber": 41,
            "region": "",
            "platform": "Azure",
            "systemService": "ActionGroup",
            "addressPrefixes": ["4.145.74.52/30", "2603:1000:4:402::178/124"]
          }
        }
      ]
    }"#;

    #[test]
    fn test_aws_json_ip_ranges() {
        let parsed = parse_aws(AWS_TEST_JSON).unwrap();
        assert_eq!(parsed.sync_token, "1640995200");
        assert_eq!(parsed.prefixes.len(), 3);
        assert_eq!(
            parsed.prefixes[0],
            AwsJsonIpPrefix {
                ip_prefix: "10.0.0.0/8".parse().unwrap(),
                region: "us-east-1",
                network_border_group: "us-east-1",
                service: "AMAZON",
            }
        );
        assert_eq!(
            parsed.ipv6_prefixes[0].ipv6_prefix,
            "2001:db8::/32".parse().unwrap()
        );
    }

    #[test]
    fn test_gcp_json_ip_ranges() {
        let parsed = parse_gcp(GCP_TEST_JSON).unwrap();
        let prefixes: Vec<IpNetwork> = parsed.prefixes.iter().filter_map(|p| p.prefix()).collect();
        assert_eq!(
            prefixes,
            vec![
                "34.1.208.0/20".parse::<IpNetwork>().unwrap(),
                "2600:1900:8000::/44".parse::<IpNetwork>().unwrap(),
            ]
        );
    }

    #[test]
    fn test_azure_json_service_tags() {
        let parsed = parse_azure(AZURE_TEST_JSON).unwrap();
        assert_eq!(parsed.change_number, Some(290));
        assert_eq!(parsed.values[0].name, "ActionGroup");
        assert_eq!(parsed.values[0].properties.address_prefixes.len(), 2);
    }

    #[test]
    fn test_missing_required_fields_fail_to_parse() {
        assert!(parse_aws(r#"{"syncToken": "1"}"#).is_err());
        assert!(parse_gcp(r#"{"syncToken": "1"}"#).is_err());
        assert!(parse_azure(r#"{"values": [{"name": "x"}]}"#).is_err());
    }
}
