// Shared wiremock fixtures for the integration tests.
#![allow(dead_code)]

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Canned register detail page. Each entry in `panels` becomes one accordion
/// panel; newlines inside an entry become separate text lines.
pub fn detail_page_html(conditions: &str, panels: &[&str]) -> String {
    let accordions: String = panels
        .iter()
        .map(|p| format!(r#"<div class="opn-accord">{p}</div>"#))
        .collect();
    format!(
        r#"<html><body>
            <div class="fsp-first-table specialinfo-table">
                <div class="container">Conditions</div>
                <div class="container">{conditions}</div>
            </div>
            <div id="raTableContainer_fsfdetail">{accordions}</div>
        </body></html>"#
    )
}

/// Register mock serving detail pages by slug. Slugs that are not mounted get
/// the mock server's default 404, which is exactly what the register does for
/// a bad slug.
pub async fn mock_register(pages: &[(&str, String)]) -> MockServer {
    let server = MockServer::start().await;
    for (slug, html) in pages {
        Mock::given(method("GET"))
            .and(path(format!("/{slug}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(html.clone())
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;
    }
    server
}

/// Server answering every request with the given status code.
pub async fn mock_status_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// Server failing with 503 for the first `failures` requests, then serving
/// the given page.
pub async fn mock_flaky_server(failures: u64, html: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(failures)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    server
}

/// Server serving the given page to any path after a fixed delay.
pub async fn mock_slow_server(delay: Duration, html: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .set_delay(delay)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    server
}

/// Catch-all notification sink accepting every POST.
pub async fn mock_ntfy_sink() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_mock_serves_mounted_slug_and_404s_the_rest() {
        let server = mock_register(&[("acme-limited", detail_page_html("None", &[]))]).await;

        let client = reqwest::Client::new();
        let ok = client
            .get(format!("{}/acme-limited", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);
        assert!(ok.text().await.unwrap().contains("raTableContainer_fsfdetail"));

        let missing = client
            .get(format!("{}/ghost-limited", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
    }

    #[tokio::test]
    async fn flaky_server_recovers_after_failures() {
        let server = mock_flaky_server(1, "ok".to_string()).await;

        let client = reqwest::Client::new();
        let first = client.get(server.uri()).send().await.unwrap();
        assert_eq!(first.status(), 503);
        let second = client.get(server.uri()).send().await.unwrap();
        assert_eq!(second.status(), 200);
    }
}
