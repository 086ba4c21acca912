use clap::{Parser, ValueEnum};
use cloudipranges::ProviderId;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Command Line Interface (CLI) Arguments
-------------------------------------------------------------------------------------------------*/

#[derive(Parser, Debug)]
#[command(author, version, about="Check IP addresses against the AWS, GCP, and Azure IP ranges.", long_about = None)]
pub struct Args {
    /// Only use these providers (AWS, GCP, Azure); defaults to all
    #[arg(short = 'p', long = "provider", value_parser = parse_provider)]
    pub providers: Option<Vec<ProviderId>>,

    /// Fetch the ranges directly, without reading or writing the local cache
    #[arg(long)]
    pub no_cache: bool,

    /// Directory for the local range cache
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Output format used when listing the loaded ranges
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Save the loaded prefixes to a CSV file
    #[arg(long = "csv")]
    pub csv_file: Option<PathBuf>,

    /// Logging verbosity
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// IP addresses to check; without any, list the loaded ranges
    pub ips: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Summary table of the providers and their prefix counts
    Table,
    /// List of (RFC4632) CIDR-format prefixes
    Cidr,
    /// List of IP networks in network mask format (n.n.n.n m.m.m.m)
    Netmask,
}

impl Args {
    /// The requested providers in the order first given, without repeats.
    pub fn selected_providers(&self) -> Vec<ProviderId> {
        let Some(providers) = &self.providers else {
            return ProviderId::ALL.to_vec();
        };

        let mut selected: Vec<ProviderId> = Vec::with_capacity(providers.len());
        for provider in providers {
            if !selected.contains(provider) {
                selected.push(*provider);
            }
        }
        selected
    }
}

fn parse_provider(value: &str) -> Result<ProviderId, String> {
    value.parse().map_err(|error: cloudipranges::Error| error.to_string())
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
