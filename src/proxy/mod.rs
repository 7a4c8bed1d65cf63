//! CORS-relaxing reverse proxy
//!
//! Forwards `/api`, `/documents` and `/cma` to the repository and CMA hosts,
//! stamps permissive CORS headers on every response and serves the UI
//! bundle, falling back to its entry document for any other GET.

pub mod rules;
pub mod server;

pub use rules::{default_rules, ProxyConfig, ProxyRule, DEFAULT_PORT, PORT_ENV};
pub use server::{apply_cors_headers, ProxyServer};
