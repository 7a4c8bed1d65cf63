// CMA Console - admin console core and CORS proxy for a headless content repository
//
// The browser front end is built separately on top of this crate: it owns a
// `ConsoleController`, loads its settings with `ConsoleConfig::load` at
// startup and renders the session. `cma-proxy` only serves that bundle.

pub mod client;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod predicate;
pub mod proxy;
pub mod session;
pub mod view;

pub use client::{CmaClient, ContentApi};
pub use config::ConsoleConfig;
pub use controller::ConsoleController;
pub use document::{Document, IdentifierPolicy, UuidIdentifiers};
pub use error::{ConsoleError, ConsoleResult, ProxyError, ProxyResult};
pub use proxy::{ProxyConfig, ProxyServer};
