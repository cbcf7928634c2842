//! Harvests driven by a configuration file on disk

use fitment_harvester::config::{load_config_with_hash, OutputFormat};
use fitment_harvester::driver::HttpDriver;
use fitment_harvester::output::create_writer;
use fitment_harvester::{Harvester, HealthState};
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CAP_PAGE: &str = r#"<html><head><title>Honda 44732-S9A-A00 Wheel Cap | Honda Parts</title></head>
  <body>
    <h1 class="product-title">Honda 44732-S9A-A00 Wheel Cap</h1>
    <div class="product-details">
      <p>This part fits the following Honda models:</p>
      <ul><li>CR-V 2002-2004</li></ul>
    </div>
  </body></html>"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write config");
    file
}

#[tokio::test]
async fn test_configured_site_and_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oem-honda-wheel_cap-44732-s9a-a00.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAP_PAGE))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("caps.jsonl");
    let file = write_config(&format!(
        r#"
[site]
base-url = "{base}"
domain = "127.0.0.1"
manufacturer = "Honda"
product-path-pattern = "/oem-honda-"
product-link-pattern = "/oem-honda-"

[fetch]
max-attempts = 1
settle-min-ms = 0
settle-max-ms = 0
scroll-pause-ms = 0
anchor-timeout-secs = 0
anchor-secondary-timeout-secs = 0

[output]
path = "{output}"
format = "jsonl"
"#,
        base = server.uri(),
        output = output.display(),
    ));

    let (config, hash) = load_config_with_hash(file.path()).unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(config.output.format, OutputFormat::Jsonl);

    let mut writer = create_writer(config.output.format, output.as_path()).unwrap();
    let driver = HttpDriver::new(&config.fetch).unwrap();
    let mut h = Harvester::new(driver, config, HealthState::shared()).unwrap();

    let url = format!("{}/oem-honda-wheel_cap-44732-s9a-a00.html", server.uri());
    let written = h.scrape_all(&[url], writer.as_mut()).await;
    writer.finish().unwrap();

    assert_eq!(written, 3);
    let rows: Vec<serde_json::Value> = std::fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let years: Vec<&str> = rows.iter().filter_map(|r| r["year"].as_str()).collect();
    assert_eq!(years, vec!["2002", "2003", "2004"]);
    assert!(rows.iter().all(|r| r["make"] == "Honda" && r["model"] == "CR-V"));
    assert_eq!(rows[0]["sku"], "44732-S9A-A00");
}

#[test]
fn test_unreadable_config_is_an_error() {
    let file = write_config("[fetch]\nmax-attempts = \"five\"\n");
    assert!(load_config_with_hash(file.path()).is_err());
}
