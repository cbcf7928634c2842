//! End-to-end harvests against a mock catalog

use fitment_harvester::config::{Config, DiscoveryConfig, OutputFormat};
use fitment_harvester::driver::HttpDriver;
use fitment_harvester::output::create_writer;
use fitment_harvester::{Harvester, HealthState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SPARE_PATH: &str = "/oem/acura~wheel~42700-tk4-a51.html";
const MAT_PATH: &str = "/oem/acura~mat~08p17-tz3-210.html";

const SPARE_PAGE: &str = r#"<html><head>
    <title>Acura 42700-TK4-A51 Spare Wheel | Acura Parts Warehouse</title>
    <meta property="og:image" content="/images/42700-tk4-a51.jpg">
  </head><body>
    <h1 class="product-title">Acura 42700-TK4-A51 Spare Wheel</h1>
    <span class="sale-price-value">$212.50</span>
    <span class="list-price-value">$305.00</span>
    <script id="product_data" type="application/json">
      {"fitment":[{"year":2021,"make":"Acura","model":"TLX","trims":["Base","A-Spec"],"engines":[""]}]}
    </script>
  </body></html>"#;

const MAT_PAGE: &str = r#"<html><head><title>Acura Floor Mat Set</title></head><body>
    <h1 class="product-title">Acura 08P17-TZ3-210 Floor Mat Set</h1>
    <span class="sale-price-value">$150.00</span>
  </body></html>"#;

/// Configuration pointed at the mock server with every wait shortened
fn test_config(base_url: &str) -> Config {
    let domain = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.site.domain = domain;
    config.fetch.max_attempts = 1;
    config.fetch.settle_min_ms = 0;
    config.fetch.settle_max_ms = 0;
    config.fetch.scroll_pause_ms = 0;
    config.fetch.anchor_timeout_secs = 0;
    config.fetch.anchor_secondary_timeout_secs = 0;
    config.fetch.challenge_timeout_secs = 0;
    config.fetch.content_wait_secs = 0;
    config.discovery = DiscoveryConfig {
        category_pages: Vec::new(),
        oem_search_terms: Vec::new(),
        models: Vec::new(),
        accessory_pages: Vec::new(),
        browse_categories: Vec::new(),
        search_paths: Vec::new(),
        max_consecutive_empty: 1,
        ..DiscoveryConfig::default()
    };
    config
}

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn harvester(config: Config) -> Harvester<HttpDriver> {
    let driver = HttpDriver::new(&config.fetch).expect("Failed to build driver");
    Harvester::new(driver, config, HealthState::shared()).expect("Failed to build harvester")
}

#[tokio::test]
async fn test_product_page_end_to_end() {
    let server = MockServer::start().await;
    serve(&server, SPARE_PATH, SPARE_PAGE).await;

    let mut h = harvester(test_config(&server.uri()));
    let url = format!("{}{}", server.uri(), SPARE_PATH);
    let rows = h.scrape_product(&url).await;

    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.url, url);
        assert_eq!(row.title, "Acura 42700-TK4-A51 Spare Wheel");
        assert_eq!(row.sku, "42700-TK4-A51");
        assert_eq!(row.normalized_part_number, "42700TK4A51");
        assert_eq!(row.actual_price, "212.50");
        assert_eq!(row.msrp, "305.00");
        assert_eq!(row.image_url, format!("{}/images/42700-tk4-a51.jpg", server.uri()));
        assert_eq!(row.year, "2021");
        assert_eq!(row.model, "TLX");
    }
    assert_eq!(rows[0].trim, "Base");
    assert_eq!(rows[1].trim, "A-Spec");
}

#[tokio::test]
async fn test_irrelevant_product_yields_no_rows() {
    let server = MockServer::start().await;
    serve(&server, MAT_PATH, MAT_PAGE).await;

    let mut h = harvester(test_config(&server.uri()));
    let rows = h.scrape_product(&format!("{}{}", server.uri(), MAT_PATH)).await;

    assert!(rows.is_empty());
    assert_eq!(h.stats().irrelevant, 1);
    assert_eq!(h.controller().health().consecutive_failures(), 0);
}

#[tokio::test]
async fn test_server_error_is_fatal_but_not_propagated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut h = harvester(test_config(&server.uri()));
    let rows = h.scrape_product(&format!("{}{}", server.uri(), SPARE_PATH)).await;

    assert!(rows.is_empty());
    assert_eq!(h.stats().fatal_fetches, 1);
    assert_eq!(h.controller().health().consecutive_failures(), 1);
}

#[tokio::test]
async fn test_catalog_run_writes_deduplicated_tsv() {
    let server = MockServer::start().await;
    let listing = format!(
        r#"<html><body><div class="products">
            <a href="{spare}">Spare Wheel</a>
            <a href="{spare}?color=silver">Spare Wheel</a>
            <a href="{base}{spare}#fitment">Spare Wheel</a>
            <a href="{mat}">Floor Mat Set</a>
            <a href="https://elsewhere.example.com{spare}">Spare Wheel</a>
        </div></body></html>"#,
        spare = SPARE_PATH,
        mat = MAT_PATH,
        base = server.uri(),
    );
    serve(&server, "/oem-acura-spare_wheel.html", &listing).await;
    serve(&server, SPARE_PATH, SPARE_PAGE).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("out").join("fitments.tsv");

    let mut config = test_config(&server.uri());
    config.discovery.category_pages = vec!["oem-acura-spare_wheel".to_string()];
    let mut h = harvester(config);
    let mut writer = create_writer(OutputFormat::Tsv, &output).unwrap();

    let stats = h.run_catalog(writer.as_mut()).await.unwrap();
    drop(writer);

    assert_eq!(stats.urls_discovered, 1);
    assert_eq!(stats.products_emitted, 1);
    assert_eq!(stats.rows_written, 2);

    let written = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("url\timage_url\tcaptured_at\tsku"));
    assert!(lines[1].contains("\t42700-TK4-A51\t"));
    assert!(lines[2].ends_with("\tTLX\tA-Spec\t"));
}

#[tokio::test]
async fn test_jsonl_output() {
    let server = MockServer::start().await;
    serve(&server, SPARE_PATH, SPARE_PAGE).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("fitments.jsonl");

    let mut h = harvester(test_config(&server.uri()));
    let mut writer = create_writer(OutputFormat::Jsonl, &output).unwrap();
    let url = format!("{}{}", server.uri(), SPARE_PATH);
    h.scrape_all(&[url], writer.as_mut()).await;
    writer.finish().unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["sku"], "42700-TK4-A51");
    assert_eq!(rows[1]["trim"], "A-Spec");
    assert_eq!(rows[1]["make"], "Acura");
}
