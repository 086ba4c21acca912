use super::{HttpClient, ProviderFetcher};
use crate::core::errors::{Error, Result};
use crate::core::json;
use crate::core::network_prefix::{NetworkPrefix, PrefixSet};
use crate::core::provider::ProviderId;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/*-------------------------------------------------------------------------------------------------
  Azure Fetcher
-------------------------------------------------------------------------------------------------*/

lazy_static! {
    static ref DOWNLOAD_URL: Regex =
        Regex::new(r#"href=["'](https://download\.microsoft\.com/.{1,500}?\.json)["']"#)
            .expect("valid download URL pattern");
    static ref HTML_ENTITY: Regex =
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity pattern");
}

/// Azure publishes its service tags under a URL that changes weekly; the current one is linked
/// from a stable download details page.
#[derive(Debug, Clone)]
pub struct AzureFetcher {
    http: HttpClient,
    details_url: String,
}

impl AzureFetcher {
    pub fn new(http: HttpClient, details_url: &str) -> Self {
        Self {
            http,
            details_url: details_url.to_string(),
        }
    }
}

impl ProviderFetcher for AzureFetcher {
    fn fetch(&self) -> Result<PrefixSet> {
        let page = self.http.get_text(ProviderId::Azure, &self.details_url)?;
        let download_url = find_download_url(&page).ok_or_else(|| {
            Error::fetch(
                ProviderId::Azure,
                "could not find the IP ranges download URL",
            )
        })?;

        let body = self.http.get_text(ProviderId::Azure, &download_url)?;
        extract_prefixes(&body)
    }
}

/// First `download.microsoft.com` JSON link in the (HTML-unescaped) details page.
fn find_download_url(page: &str) -> Option<String> {
    let page = unescape_html(page);
    DOWNLOAD_URL
        .captures(&page)
        .map(|captures| captures[1].to_string())
}

/// Prefixes of the first service tag, which is the aggregate of every Azure prefix.
fn extract_prefixes(body: &str) -> Result<PrefixSet> {
    let tags = json::parse_azure(body).map_err(|error| Error::fetch(ProviderId::Azure, error))?;
    let first = tags
        .values
        .first()
        .ok_or_else(|| Error::fetch(ProviderId::Azure, "service tags file has no values"))?;

    Ok(first
        .properties
        .address_prefixes
        .iter()
        .copied()
        .map(NetworkPrefix::from)
        .collect())
}

fn unescape_html(text: &str) -> String {
    HTML_ENTITY
        .replace_all(text, |captures: &Captures| {
            let entity = &captures[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}
