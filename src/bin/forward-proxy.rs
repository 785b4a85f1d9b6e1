use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use log::{LevelFilter, debug, info, warn};
use reqwest::Url;
use serde_json::json;
use std::env;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const AUTH_HEADER: &str = "auth-token";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection-scoped headers that must not be relayed (RFC 9110 §7.6.1).
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

#[derive(Clone)]
struct ProxyState {
    client: reqwest::Client,
    auth_token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let addr = env::var("DRAGTUI_PROXY_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let auth_token = env::var("DRAGTUI_AUTH_TOKEN").unwrap_or_default();
    if auth_token.is_empty() {
        warn!("DRAGTUI_AUTH_TOKEN is not set, forwarding without a token");
    }

    let client = reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;
    let app = router(ProxyState { client, auth_token });

    let listener = TcpListener::bind(&addr).await?;
    info!("forward proxy listening at http://{addr}/forward");
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(AUTH_HEADER),
        ]);

    Router::new()
        .route("/forward", any(forward))
        .layer(cors)
        .with_state(state)
}

async fn forward(
    State(state): State<ProxyState>,
    method: Method,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some((target, rest)) = split_target(params) else {
        return error_response(StatusCode::BAD_REQUEST, "Target URL is required");
    };
    let target = match target_url(&target, &rest) {
        Ok(url) => url,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid target URL: {e}")),
    };
    debug!("{method} {target}");

    let mut request = state
        .client
        .request(method, target.clone())
        .header(AUTH_HEADER, &state.auth_token);
    if !body.is_empty() {
        if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(upstream) => upstream,
        Err(e) => {
            warn!("forwarding to {target} failed: {e}");
            let status = e.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return error_response(status, &e.to_string());
        }
    };

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();
    match upstream.bytes().await {
        Ok(bytes) => relay(status, &upstream_headers, bytes),
        Err(e) => {
            warn!("reading body from {target} failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Pull the `url` parameter out of the query, keeping the rest in order.
fn split_target(params: Vec<(String, String)>) -> Option<(String, Vec<(String, String)>)> {
    let mut target = None;
    let mut rest = Vec::with_capacity(params.len());
    for (key, value) in params {
        if key == "url" && target.is_none() {
            target = Some(value);
        } else {
            rest.push((key, value));
        }
    }
    target.filter(|t| !t.trim().is_empty()).map(|t| (t, rest))
}

/// Target URL with the remaining query parameters appended.
fn target_url(target: &str, rest: &[(String, String)]) -> Result<Url, String> {
    let mut url = Url::parse(target).map_err(|e| e.to_string())?;
    if !rest.is_empty() {
        url.query_pairs_mut().extend_pairs(rest);
    }
    Ok(url)
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn relay(status: StatusCode, upstream_headers: &HeaderMap, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    for (name, value) in upstream_headers {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    response
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn state() -> ProxyState {
        ProxyState { client: reqwest::Client::new(), auth_token: "secret".into() }
    }

    #[test]
    fn target_is_split_from_other_params() {
        let (target, rest) =
            split_target(pairs(&[("a", "1"), ("url", "https://x/y"), ("b", "2")])).unwrap();
        assert_eq!(target, "https://x/y");
        assert_eq!(rest, pairs(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn remaining_params_are_appended_to_target() {
        let url = target_url("https://x/getdates?a=1", &pairs(&[("displaydate", "2025-03-01")])).unwrap();
        assert_eq!(url.as_str(), "https://x/getdates?a=1&displaydate=2025-03-01");
        assert!(target_url("not a url", &[]).is_err());
    }

    #[test]
    fn missing_or_blank_target_is_rejected() {
        assert!(split_target(pairs(&[("a", "1")])).is_none());
        assert!(split_target(pairs(&[("url", "  ")])).is_none());
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONNECTION, "close".parse().unwrap());
        upstream.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        upstream.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());

        let response = relay(StatusCode::CREATED, &upstream, Bytes::from_static(b"{}"));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::CONNECTION).is_none());
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn missing_url_is_a_bad_request() {
        let response = forward(
            State(state()),
            Method::GET,
            Query(Vec::new()),
            HeaderMap::new(),
            Bytes::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forwards_with_token_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/getdates")
            .match_header("Auth-Token", "secret")
            .match_query(mockito::Matcher::UrlEncoded("displaydate".into(), "2025-03-01".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":false,"msg":[]}"#)
            .create_async()
            .await;

        let target = format!("{}/getdates", server.url());
        let response = forward(
            State(state()),
            Method::GET,
            Query(pairs(&[("url", &target), ("displaydate", "2025-03-01")])),
            HeaderMap::new(),
            Bytes::new(),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn upstream_status_passes_through() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/x").with_status(404).create_async().await;

        let response = forward(
            State(state()),
            Method::POST,
            Query(pairs(&[("url", &format!("{}/x", server.url()))])),
            HeaderMap::new(),
            Bytes::from_static(b"payload"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreachable_target_is_a_server_error() {
        let response = forward(
            State(state()),
            Method::GET,
            Query(pairs(&[("url", "http://127.0.0.1:1/nothing")])),
            HeaderMap::new(),
            Bytes::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
