mod cli;

use clap::Parser;
use cloudipranges::{CloudRangeRegistry, ConfigBuilder, FetcherTable, FileCache, Result};
use log::error;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(args.verbose.log_level_filter())
        .init()
        .ok();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            error!("{error}");
            ExitCode::from(2)
        }
    }
}

/// Load the ranges and report on them; `Ok(false)` when any IP argument is not a cloud IP.
fn run(args: &cli::Args) -> Result<bool> {
    let mut config_builder = ConfigBuilder::new();
    if let Some(cache_dir) = &args.cache_dir {
        config_builder.cache_dir(cache_dir);
    }
    let config = config_builder.build();
    let providers = args.selected_providers();

    let registry = CloudRangeRegistry::new(FetcherTable::standard(&config), &config);

    if args.no_cache {
        registry.refresh_sync(&providers)?;
    } else {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let cache = Arc::new(FileCache::new(config.cache_dir()));
        runtime.block_on(registry.attach_cache(cache, &providers));
    }

    if let Some(csv_file) = &args.csv_file {
        cli::csv::save(&registry, &providers, csv_file)?;
    }

    if !args.ips.is_empty() {
        let ip_matches = cli::check_ips(&registry, &args.ips, &providers);
        cli::log::ip_matches(&ip_matches);
        cli::output::ip_match_table(&ip_matches);
        return Ok(ip_matches.iter().all(cli::IpMatch::is_cloud_ip));
    }

    match args.output {
        cli::OutputFormat::Table => cli::output::provider_table(&registry, &providers),
        cli::OutputFormat::Cidr => cli::output::prefixes_in_cidr_format(&registry, &providers),
        cli::OutputFormat::Netmask => {
            cli::output::prefixes_in_netmask_format(&registry, &providers)
        }
    }

    Ok(true)
}
