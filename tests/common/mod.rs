//! Mock content repository served by warp on an ephemeral port.
//!
//! Serves the upstream paths (`/api/v2/`, `/api/v2/documents/search`,
//! `/documents`, `/documents/{id}`), checks the bearer token and records
//! every request it accepts.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use cma_console::config::{CmaEndpoints, Endpoints};
use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

pub const TOKEN: &str = "test-token";
pub const MASTER_REF: &str = "master-1";
pub const CURRENT_REF: &str = "current-ref";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
}

pub struct MockRepository {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn reply(status: StatusCode, body: Value) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&body), status)
}

fn authorized(header: &Option<String>) -> bool {
    header.as_deref() == Some(&format!("Bearer {}", TOKEN)[..])
}

fn record(log: &Arc<Mutex<Vec<RecordedRequest>>>, method: &str, path: String, body: Value) {
    log.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path,
        body,
    });
}

/// Documents the search endpoint knows about.
pub fn fixture_documents() -> Vec<Value> {
    vec![
        json!({
            "id": "d1",
            "type": "blog-post",
            "ref": CURRENT_REF,
            "data": { "title": [{ "text": "Hello" }] },
            "last_publication_date": "2024-01-01T00:00:00Z"
        }),
        json!({
            "id": "p1",
            "type": "page",
            "data": { "title": [{ "type": "heading1", "text": "About" }] },
            "first_publication_date": "2023-06-01T12:00:00+0000"
        }),
    ]
}

impl MockRepository {
    pub fn spawn(with_master: bool) -> Self {
        let log: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));

        let repository = warp::get()
            .and(warp::path!("api" / "v2"))
            .and(warp::header::optional::<String>("authorization"))
            .map(move |auth: Option<String>| {
                if !authorized(&auth) {
                    return reply(StatusCode::UNAUTHORIZED, json!({ "error": "bad token" }));
                }
                let mut refs = vec![json!({ "id": "preview", "ref": "preview-1", "isMasterRef": false })];
                if with_master {
                    refs.push(json!({ "id": "master", "ref": MASTER_REF, "isMasterRef": true }));
                }
                reply(StatusCode::OK, json!({ "refs": refs }))
            });

        let search_log = Arc::clone(&log);
        let search = warp::get()
            .and(warp::path!("api" / "v2" / "documents" / "search"))
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::header::optional::<String>("authorization"))
            .map(move |query: HashMap<String, String>, auth: Option<String>| {
                if !authorized(&auth) {
                    return reply(StatusCode::UNAUTHORIZED, json!({ "error": "bad token" }));
                }
                let q = query.get("q").cloned().unwrap_or_default();
                record(
                    &search_log,
                    "GET",
                    "/api/v2/documents/search".to_string(),
                    json!({ "q": q, "ref": query.get("ref") }),
                );

                if query.get("ref").map(String::as_str) != Some(MASTER_REF) {
                    return reply(StatusCode::BAD_REQUEST, json!({ "error": "unknown ref" }));
                }
                let Some(content_type) = q
                    .strip_prefix("[[at(document.type,\"")
                    .and_then(|rest| rest.strip_suffix("\")]]"))
                else {
                    return reply(StatusCode::BAD_REQUEST, json!({ "error": "unsupported query" }));
                };

                let results: Vec<Value> = fixture_documents()
                    .into_iter()
                    .filter(|doc| doc["type"] == content_type)
                    .collect();
                reply(StatusCode::OK, json!({ "results": results }))
            });

        let create_log = Arc::clone(&log);
        let create = warp::post()
            .and(warp::path!("documents"))
            .and(warp::body::json())
            .and(warp::header::optional::<String>("authorization"))
            .map(move |body: Value, auth: Option<String>| {
                if !authorized(&auth) {
                    return reply(StatusCode::UNAUTHORIZED, json!({ "error": "bad token" }));
                }
                record(&create_log, "POST", "/documents".to_string(), body.clone());
                reply(StatusCode::CREATED, body)
            });

        let update_log = Arc::clone(&log);
        let update = warp::patch()
            .and(warp::path!("documents" / String))
            .and(warp::body::json())
            .and(warp::header::optional::<String>("authorization"))
            .map(move |id: String, body: Value, auth: Option<String>| {
                if !authorized(&auth) {
                    return reply(StatusCode::UNAUTHORIZED, json!({ "error": "bad token" }));
                }
                record(&update_log, "PATCH", format!("/documents/{}", id), body.clone());
                if body["ref"] != CURRENT_REF {
                    return reply(StatusCode::CONFLICT, json!({ "error": "stale ref" }));
                }
                reply(StatusCode::OK, json!({ "id": id, "ref": "next-ref" }))
            });

        let delete_log = Arc::clone(&log);
        let delete = warp::delete()
            .and(warp::path!("documents" / String))
            .and(warp::header::optional::<String>("authorization"))
            .map(move |id: String, auth: Option<String>| {
                if !authorized(&auth) {
                    return reply(StatusCode::UNAUTHORIZED, json!({ "error": "bad token" }));
                }
                record(&delete_log, "DELETE", format!("/documents/{}", id), Value::Null);
                if id == "missing" {
                    return reply(StatusCode::NOT_FOUND, json!({ "error": "no such document" }));
                }
                reply(StatusCode::OK, json!({}))
            });

        let routes = repository.or(search).or(create).or(update).or(delete);
        let (addr, serving) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(serving);

        Self { addr, log }
    }

    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Endpoints pointing straight at the mock.
    pub fn endpoints(&self) -> Endpoints {
        let base = self.base();
        Endpoints {
            repository: format!("{}/api/v2/", base),
            documents: format!("{}/api/v2/documents/search", base),
            cma: CmaEndpoints {
                base: base.clone(),
                documents: format!("{}/documents", base),
            },
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn search_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path == "/api/v2/documents/search")
            .count()
    }

    pub fn last(&self, method: &str) -> Option<RecordedRequest> {
        self.requests().into_iter().rev().find(|r| r.method == method)
    }
}
