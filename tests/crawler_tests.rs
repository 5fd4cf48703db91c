//! Integration tests for page crawling and link extraction

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use linkscope::config::AuditConfig;
use linkscope::crawler::build_http_client;
use linkscope::PageCrawler;

fn test_config() -> AuditConfig {
    AuditConfig {
        delay_ms: 10,
        ..AuditConfig::default()
    }
}

fn test_crawler(config: &AuditConfig, base_url: &str) -> PageCrawler {
    let client = build_http_client(config).unwrap();
    PageCrawler::new(client, config, base_url)
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_moved_page_is_still_crawled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_response(r#"<a href="/docs">Docs</a>"#))
        .mount(&server)
        .await;

    let config = test_config();
    let crawler = test_crawler(&config, &server.uri());
    let links = crawler.crawl_page(&format!("{}/old", server.uri())).await;

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].link_url, format!("{}/docs", server.uri()));
}

#[tokio::test]
async fn test_crawl_extracts_and_classifies_links() {
    let server = MockServer::start().await;
    let body = format!(
        r#"<html><body>
            <a href="/about">About us</a>
            <a href="{0}/contact">Contact</a>
            <a href="https://external.example.org/page">Elsewhere</a>
            <a href="mailto:team@example.com">Mail</a>
        </body></html>"#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(&body))
        .mount(&server)
        .await;

    let config = test_config();
    let crawler = test_crawler(&config, &server.uri());
    let page = format!("{}/", server.uri());
    let links = crawler.crawl_page(&page).await;

    assert_eq!(links.len(), 3);
    assert_eq!(links[0].link_url, format!("{}/about", server.uri()));
    assert_eq!(links[0].link_text, "About us");
    assert!(links[0].is_internal);
    assert!(links[1].is_internal);
    assert!(!links[2].is_internal);
    for link in &links {
        assert_eq!(link.source_url, page);
    }
}

#[tokio::test]
async fn test_non_html_page_yields_no_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4".to_vec()),
        )
        .mount(&server)
        .await;

    let config = test_config();
    let crawler = test_crawler(&config, &server.uri());
    let links = crawler
        .crawl_page(&format!("{}/report.pdf", server.uri()))
        .await;

    assert!(links.is_empty());
}

#[tokio::test]
async fn test_error_page_yields_no_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config();
    let crawler = test_crawler(&config, &server.uri());
    let links = crawler
        .crawl_page(&format!("{}/missing", server.uri()))
        .await;

    assert!(links.is_empty());
}

#[tokio::test]
async fn test_unreachable_page_yields_no_links() {
    let config = test_config();
    let crawler = test_crawler(&config, "http://127.0.0.1:1");
    let links = crawler.crawl_page("http://127.0.0.1:1/page").await;

    assert!(links.is_empty());
}

#[tokio::test]
async fn test_subdomain_classification_follows_config() {
    let server = MockServer::start().await;
    let body = r#"<a href="https://blog.example.com/post">Post</a>"#;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(body))
        .mount(&server)
        .await;

    let config = AuditConfig {
        include_subdomains: true,
        ..test_config()
    };
    // Base is a public domain here, so the subdomain counts as internal
    let crawler = PageCrawler::new(
        build_http_client(&config).unwrap(),
        &config,
        "https://example.com",
    );
    let page = format!("{}/", server.uri());
    let links = crawler.crawl_page(&page).await;

    assert_eq!(links.len(), 1);
    assert!(links[0].is_internal);
}
