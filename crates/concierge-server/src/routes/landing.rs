//! Landing page at `/`.
//!
//! Redirects to the configured front end, embeds it in an iframe, or shows a
//! small status page when no target is configured.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::state::AppState;

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let landing = &state.config.landing;
    let target = landing
        .target_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    match target {
        Some(url) if landing.embed => Html(embed_page(url)).into_response(),
        Some(url) => (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response(),
        None => Html(status_page()).into_response(),
    }
}

fn embed_page(url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Travel Concierge</title>
<style>html, body {{ margin: 0; height: 100%; }} iframe {{ border: 0; width: 100%; height: 100%; }}</style>
</head>
<body>
<iframe src="{}" title="Travel Concierge"></iframe>
</body>
</html>
"#,
        escape_attr(url)
    )
}

fn status_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Travel Concierge</title></head>
<body>
<h1>Travel Concierge</h1>
<p>API server v{} is running. See <a href="/health">/health</a>.</p>
</body>
</html>
"#,
        env!("CARGO_PKG_VERSION")
    )
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use axum::body::Body;
    use axum::http::Request;
    use concierge_core::Config;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_root(config: Config) -> Response {
        let store = Arc::new(config.state_store());
        let state = AppState::with_concierge(config, store, None);
        create_router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_redirects_to_target() {
        let mut config = Config::default();
        config.landing.target_url = Some("https://concierge.example.com".to_string());

        let response = get_root(config).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://concierge.example.com"
        );
    }

    #[tokio::test]
    async fn test_embeds_target() {
        let mut config = Config::default();
        config.landing.target_url = Some("https://example.com/?a=1&b=2".to_string());
        config.landing.embed = true;

        let response = get_root(config).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"<iframe src="https://example.com/?a=1&amp;b=2""#));
    }

    #[tokio::test]
    async fn test_status_page_without_target() {
        let mut config = Config::default();
        config.landing.target_url = Some("  ".to_string());

        let response = get_root(config).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("API server"));
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a"b<c>&"#), "a&quot;b&lt;c&gt;&amp;");
    }
}
