//! Routing rules and proxy configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 3000;
/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "PORT";

/// Repository host serving metadata and document search.
pub const REPOSITORY_HOST: &str = "https://zaheb.cdn.prismic.io";
/// Host serving the Content Management API.
pub const CMA_HOST: &str = "https://customtypes.prismic.io";

/// Forward requests under `prefix` to `upstream`, replacing the prefix with
/// `rewrite_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    pub prefix: String,
    pub upstream: String,
    pub rewrite_to: String,
}

impl ProxyRule {
    pub fn new(
        prefix: impl Into<String>,
        upstream: impl Into<String>,
        rewrite_to: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            upstream: upstream.into(),
            rewrite_to: rewrite_to.into(),
        }
    }

    /// Path the upstream sees, or `None` when `path` is not under the prefix.
    ///
    /// The prefix matches whole segments only: `/api` covers `/api` and
    /// `/api/...` but not `/apix`.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(&self.prefix)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        Some(format!("{}{}", self.rewrite_to, rest))
    }

    /// Absolute upstream URL for `path`, without query.
    pub fn target_url(&self, path: &str) -> Option<String> {
        let rewritten = self.rewrite(path)?;
        Some(format!("{}{}", self.upstream.trim_end_matches('/'), rewritten))
    }
}

/// `/api` and `/documents` to the repository host, `/cma` to the CMA host.
pub fn default_rules(repository_host: &str, cma_host: &str) -> Vec<ProxyRule> {
    vec![
        ProxyRule::new("/api", repository_host, "/api/v2"),
        ProxyRule::new("/documents", repository_host, "/api/v2/documents"),
        ProxyRule::new("/cma", cma_host, "/documents"),
    ]
}

/// First rule that covers `path`, with the resulting upstream URL.
pub fn route(rules: &[ProxyRule], path: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule.target_url(path))
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Directory holding the UI bundle; its `index.html` is the fallback.
    pub static_root: PathBuf,
    pub rules: Vec<ProxyRule>,
}

impl ProxyConfig {
    /// Defaults with the `PORT` override applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_port_override(std::env::var(PORT_ENV).ok());
        config
    }

    /// Use `value` as port when it parses; otherwise keep the current one.
    pub fn apply_port_override(&mut self, value: Option<String>) {
        let Some(value) = value else {
            return;
        };
        match value.trim().parse::<u16>() {
            Ok(port) => self.port = port,
            Err(e) => log::warn!("Ignoring {}={:?}: {}", PORT_ENV, value, e),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = root.into();
        self
    }

    /// Point the default rules at other hosts.
    pub fn with_upstreams(mut self, repository_host: &str, cma_host: &str) -> Self {
        self.rules = default_rules(repository_host, cma_host);
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn index_file(&self) -> PathBuf {
        self.static_root.join("index.html")
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            static_root: PathBuf::from("web_static"),
            rules: default_rules(REPOSITORY_HOST, CMA_HOST),
        }
    }
}
