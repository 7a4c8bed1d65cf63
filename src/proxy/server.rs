//! warp server forwarding proxied prefixes through reqwest.
//!
//! Upstream responses pass through unchanged apart from hop-by-hop headers
//! and the CORS headers, which always win over whatever the upstream sent.
//! No retries; a request that cannot reach the upstream gets a 502.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use warp::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, HOST,
};
use warp::http::{Method, Response, StatusCode};
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

use super::rules::{route, ProxyConfig};
use crate::error::{ProxyError, ProxyResult};

const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Set the CORS allowance headers, replacing existing values.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(CONTENT_LENGTH);
}

fn empty_response(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    apply_cors_headers(response.headers_mut());
    response
}

/// Stateless proxy: immutable configuration plus a shared HTTP client.
pub struct ProxyServer {
    config: ProxyConfig,
    http: reqwest::Client,
}

impl ProxyServer {
    pub fn new(config: ProxyConfig) -> ProxyResult<Self> {
        for rule in &config.rules {
            if !rule.upstream.starts_with("http://") && !rule.upstream.starts_with("https://") {
                return Err(ProxyError::InvalidUpstream(rule.upstream.clone()));
            }
        }

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { config, http })
    }

    /// Upstream URL for a request path, if a rule covers it.
    pub fn resolve(&self, path: &str) -> Option<String> {
        route(&self.config.rules, path)
    }

    /// Forward one request and relay the upstream's answer.
    async fn forward(
        &self,
        method: Method,
        url: &str,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> ProxyResult<Response<Bytes>> {
        strip_hop_by_hop(&mut headers);
        // The client sets Host from the target URL.
        headers.remove(HOST);

        let upstream = self
            .http
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let mut upstream_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut upstream_headers);
        let payload = upstream.bytes().await?;

        let mut response = Response::builder().status(status).body(payload)?;
        *response.headers_mut() = upstream_headers;
        apply_cors_headers(response.headers_mut());
        Ok(response)
    }

    /// Preflight, proxy rules, static files, then the SPA fallback.
    pub fn routes(
        self: &Arc<Self>,
    ) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone + Send + Sync + 'static
    {
        let preflight = warp::options().map(|| empty_response(StatusCode::NO_CONTENT));

        let routing = Arc::clone(self);
        let proxy = warp::path::full()
            .and_then(move |path: FullPath| {
                let server = Arc::clone(&routing);
                async move {
                    server
                        .resolve(path.as_str())
                        .ok_or_else(warp::reject::not_found)
                }
            })
            .and(warp::method())
            .and(
                warp::query::raw()
                    .or(warp::any().map(String::new))
                    .unify(),
            )
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .and(with_server(Arc::clone(self)))
            .and_then(handle_proxy);

        let static_files = warp::get().and(warp::fs::dir(self.config.static_root.clone()));
        let fallback = warp::get().and(warp::fs::file(self.config.index_file()));

        preflight
            .or(proxy)
            .or(static_files)
            .or(fallback)
            .with(warp::reply::with::header("access-control-allow-origin", "*"))
    }

    fn bind(
        self: &Arc<Self>,
    ) -> ProxyResult<(SocketAddr, impl Future<Output = ()> + 'static)> {
        warp::serve(self.routes())
            .try_bind_ephemeral(self.config.socket_addr())
            .map_err(|e| ProxyError::Bind(e.to_string()))
    }

    /// Bind and serve in the background. Returns the bound address.
    pub fn spawn(self: Arc<Self>) -> ProxyResult<SocketAddr> {
        let (addr, serving) = self.bind()?;
        tokio::spawn(serving);
        Ok(addr)
    }

    /// Bind and serve until the process ends.
    pub async fn run(self: Arc<Self>) -> ProxyResult<()> {
        let (addr, serving) = self.bind()?;

        println!("Proxy server running on http://localhost:{}", addr.port());
        for rule in &self.config.rules {
            log::info!("{} -> {}{}", rule.prefix, rule.upstream, rule.rewrite_to);
        }

        serving.await;
        Ok(())
    }
}

fn with_server(
    server: Arc<ProxyServer>,
) -> impl Filter<Extract = (Arc<ProxyServer>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || Arc::clone(&server))
}

async fn handle_proxy(
    target: String,
    method: Method,
    query: String,
    headers: HeaderMap,
    body: Bytes,
    server: Arc<ProxyServer>,
) -> Result<Response<Bytes>, Rejection> {
    let url = if query.is_empty() {
        target
    } else {
        format!("{}?{}", target, query)
    };
    log::debug!("{} -> {}", method, url);

    match server.forward(method, &url, headers, body).await {
        Ok(response) => Ok(response),
        Err(e) => {
            log::error!("Proxy request to {} failed: {}", url, e);
            Ok(empty_response(StatusCode::BAD_GATEWAY))
        }
    }
}
