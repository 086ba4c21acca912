use assert_cmd::Command;
use std::fs;
use std::path::Path;

/*-------------------------------------------------------------------------------------------------
  cloudipranges Binary Tests
-------------------------------------------------------------------------------------------------*/

/// Run the binary with every provider URL pointing at a closed local port, so nothing here
/// touches the network.
fn offline_command() -> Command {
    let mut command = Command::cargo_bin("cloudipranges").unwrap();
    command
        .env("CLOUDIPRANGES_AWS_URL", "http://127.0.0.1:9/ip-ranges.json")
        .env("CLOUDIPRANGES_GCP_URL", "http://127.0.0.1:9/cloud.json")
        .env("CLOUDIPRANGES_AZURE_DETAILS_URL", "http://127.0.0.1:9/details.aspx")
        .env("CLOUDIPRANGES_RETRY_COUNT", "1")
        .env("CLOUDIPRANGES_IO_TIMEOUT", "500")
        .env("CLOUDIPRANGES_FETCH_TIMEOUT", "2000");
    command
}

/// Seed a file cache entry the way `FileCache` writes them.
fn seed_cache(dir: &Path, provider: &str, value: &str) {
    let namespace_dir = dir.join("cloud_ranges");
    fs::create_dir_all(&namespace_dir).unwrap();
    fs::write(
        namespace_dir.join(format!("{provider}.json")),
        format!(r#"{{"expires_at": "2999-01-01T00:00:00Z", "value": "{value}"}}"#),
    )
    .unwrap();
}

/*--------------------------------------------------------------------------------------
  Version and Help
--------------------------------------------------------------------------------------*/

#[test]
fn command_version() {
    Command::cargo_bin("cloudipranges")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}

#[test]
fn command_help() {
    Command::cargo_bin("cloudipranges")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

/*--------------------------------------------------------------------------------------
  Arguments
--------------------------------------------------------------------------------------*/

#[test]
fn command_unknown_provider() {
    Command::cargo_bin("cloudipranges")
        .unwrap()
        .arg("--provider")
        .arg("aws")
        .assert()
        .failure()
        .code(2);
}

/*--------------------------------------------------------------------------------------
  Check IP Addresses
--------------------------------------------------------------------------------------*/

/*-----------------------------------------------------------------------------
  Check: Cached Cloud IP
-----------------------------------------------------------------------------*/

#[test]
fn command_check_cached_cloud_ip() {
    let cache_dir = tempfile::tempdir().unwrap();
    seed_cache(cache_dir.path(), "AWS", "10.0.0.0/8,10.1.0.0/16");

    let output = offline_command()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("--provider")
        .arg("AWS")
        .arg("10.1.2.3")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("AWS"));
    assert!(stdout.contains("10.1.0.0/16"));
}

/*-----------------------------------------------------------------------------
  Check: IP Address Not Found
-----------------------------------------------------------------------------*/

#[test]
fn command_check_ip_address_not_found() {
    let cache_dir = tempfile::tempdir().unwrap();
    seed_cache(cache_dir.path(), "AWS", "10.0.0.0/8");

    offline_command()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("--provider")
        .arg("AWS")
        .arg("1.1.1.1")
        .assert()
        .failure()
        .code(1);
}

/*-----------------------------------------------------------------------------
  Check: Unreachable Providers
-----------------------------------------------------------------------------*/

#[test]
fn command_check_with_unreachable_providers() {
    offline_command()
        .arg("--no-cache")
        .arg("52.94.76.1")
        .assert()
        .failure()
        .code(1);
}

/*-----------------------------------------------------------------------------
  Check: Invalid IP Address
-----------------------------------------------------------------------------*/

#[test]
fn command_check_invalid_ip_address() {
    offline_command()
        .arg("--no-cache")
        .arg("not-an-ip")
        .assert()
        .failure()
        .code(1);
}

/*--------------------------------------------------------------------------------------
  Output Formats
--------------------------------------------------------------------------------------*/

#[test]
fn command_output_cidr() {
    let cache_dir = tempfile::tempdir().unwrap();
    seed_cache(cache_dir.path(), "GCP", "34.1.208.0/20,2600:1900:8000::/44");

    let output = offline_command()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("--provider")
        .arg("GCP")
        .arg("--output")
        .arg("cidr")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "34.1.208.0/20\n2600:1900:8000::/44\n"
    );
}

#[test]
fn command_output_netmask() {
    let cache_dir = tempfile::tempdir().unwrap();
    seed_cache(cache_dir.path(), "Azure", "20.0.0.0/8");

    let output = offline_command()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("--provider")
        .arg("Azure")
        .arg("--output")
        .arg("netmask")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(String::from_utf8(output).unwrap(), "20.0.0.0 255.0.0.0\n");
}

#[test]
fn command_output_table() {
    offline_command()
        .arg("--no-cache")
        .arg("--output")
        .arg("table")
        .assert()
        .success();
}

/*--------------------------------------------------------------------------------------
  Save to CSV
--------------------------------------------------------------------------------------*/

#[test]
fn command_save_to_csv() {
    let cache_dir = tempfile::tempdir().unwrap();
    seed_cache(cache_dir.path(), "AWS", "10.0.0.0/8");
    let csv_file = cache_dir.path().join("ranges.csv");

    offline_command()
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .arg("--provider")
        .arg("AWS")
        .arg("--csv")
        .arg(&csv_file)
        .assert()
        .success();

    let contents = fs::read_to_string(&csv_file).unwrap();
    assert_eq!(contents, "Provider,IP Prefix\nAWS,10.0.0.0/8\n");
}
