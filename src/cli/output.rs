use crate::cli::core::IpMatch;
use cloudipranges::{CloudRangeRegistry, ProviderId, RangeSource};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;

/*-------------------------------------------------------------------------------------------------
  Output Functions
-------------------------------------------------------------------------------------------------*/

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(
        headers
            .iter()
            .map(|header| {
                Cell::new(header)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Green)
            })
            .collect::<Vec<Cell>>(),
    );

    table
}

/*--------------------------------------------------------------------------------------
  IP Match Table
--------------------------------------------------------------------------------------*/

pub fn ip_match_table(ip_matches: &[IpMatch]) {
    let mut table = new_table(&["IP Address", "Provider", "IP Prefix"]);

    for ip_match in ip_matches {
        let input = Cell::new(&ip_match.input).add_attribute(Attribute::Bold);
        match (ip_match.address, ip_match.matches.is_empty()) {
            (None, _) => {
                table.add_row(vec![input, Cell::new("invalid IP address").fg(Color::Red)]);
            }
            (Some(_), true) => {
                table.add_row(vec![input, Cell::new("-"), Cell::new("-")]);
            }
            (Some(_), false) => {
                let providers: Vec<&str> = ip_match
                    .matches
                    .iter()
                    .map(|(provider, _)| provider.as_str())
                    .collect();
                let prefixes: Vec<String> = ip_match
                    .matches
                    .iter()
                    .map(|(_, prefix)| prefix.to_string())
                    .collect();
                table.add_row(vec![
                    input,
                    Cell::new(providers.join("\n")),
                    Cell::new(prefixes.join("\n")),
                ]);
            }
        }
    }

    println!("{table}");
}

/*--------------------------------------------------------------------------------------
  Provider Summary Table
--------------------------------------------------------------------------------------*/

pub fn provider_table(registry: &CloudRangeRegistry, providers: &[ProviderId]) {
    let mut table = new_table(&["Provider", "IPv4 Prefixes", "IPv6 Prefixes", "Source", "Updated"]);

    for provider in providers {
        let Some(snapshot) = registry.snapshot(*provider) else {
            continue;
        };
        let ipv4_count = snapshot.prefixes().iter().filter(|p| p.is_ipv4()).count();
        let ipv6_count = snapshot.prefixes().len() - ipv4_count;
        let source = match snapshot.source() {
            RangeSource::Empty => "unavailable",
            RangeSource::Cache => "cache",
            RangeSource::Fetch => "fetched",
        };
        let updated = snapshot
            .updated_at()
            .map(|updated_at| updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(provider).add_attribute(Attribute::Bold),
            Cell::new(ipv4_count),
            Cell::new(ipv6_count),
            Cell::new(source),
            Cell::new(updated),
        ]);
    }

    // Right-align the prefix count columns
    for index in [1, 2] {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    println!("{table}");
}

/*--------------------------------------------------------------------------------------
  Prefixes In CIDR Format
--------------------------------------------------------------------------------------*/

pub fn prefixes_in_cidr_format(registry: &CloudRangeRegistry, providers: &[ProviderId]) {
    for provider in providers {
        if let Some(snapshot) = registry.snapshot(*provider) {
            for prefix in snapshot.prefixes() {
                println!("{prefix}");
            }
        }
    }
}

/*--------------------------------------------------------------------------------------
  Prefixes In Netmask Format
--------------------------------------------------------------------------------------*/

pub fn prefixes_in_netmask_format(registry: &CloudRangeRegistry, providers: &[ProviderId]) {
    for provider in providers {
        if let Some(snapshot) = registry.snapshot(*provider) {
            for prefix in snapshot.prefixes() {
                println!("{} {}", prefix.network().network(), prefix.network().mask());
            }
        }
    }
}
