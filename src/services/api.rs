//! # In-process HTTP route table.
//!
//! Plugins register their endpoints through [`ApiService::handle`]; the host
//! (or a test) invokes them through [`ApiService::dispatch`]. Serving the
//! table over a socket is left to the embedding program.
//!
//! ## Matching
//! - exact path match
//! - a route registered with no methods answers every method
//! - known path, wrong method → `405`; unknown path → `404`
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use plughost::{ApiService, Request, Response, RouteTable};
//!
//! let api = RouteTable::new();
//! api.handle("/ping", &["GET"], Arc::new(|_req: &Request| Response::text(200, "pong")))
//!     .unwrap();
//!
//! assert_eq!(api.dispatch("GET", "/ping", b"").body, b"pong");
//! assert_eq!(api.dispatch("POST", "/ping", b"").status, 405);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::error::ApiError;

/// Method key used by routes that accept any method.
const ANY: &str = "*";

/// Incoming in-process request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

/// Handler response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into().into_bytes(),
        }
    }

    /// JSON response; a value that fails to serialize yields `500`.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json; charset=utf-8",
                body,
            },
            Err(e) => Self::text(500, e.to_string()),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::text(status, "")
    }
}

/// Route handler.
pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// HTTP route registration collaborator handed to plugins.
pub trait ApiService: Send + Sync {
    /// Registers `handler` for `path` and `methods` (empty = any method).
    fn handle(&self, path: &str, methods: &[&str], handler: Handler) -> Result<(), ApiError>;

    /// Registered `(method, path)` pairs, sorted.
    fn routes(&self) -> Vec<(String, String)>;

    /// Invokes the handler registered for `method` and `path`.
    fn dispatch(&self, method: &str, path: &str, body: &[u8]) -> Response;
}

/// In-memory [`ApiService`].
#[derive(Default)]
pub struct RouteTable {
    routes: RwLock<BTreeMap<String, BTreeMap<String, Handler>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApiService for RouteTable {
    fn handle(&self, path: &str, methods: &[&str], handler: Handler) -> Result<(), ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidPath {
                path: path.to_string(),
            });
        }
        let methods: Vec<String> = if methods.is_empty() {
            vec![ANY.to_string()]
        } else {
            methods.iter().map(|m| m.to_ascii_uppercase()).collect()
        };

        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let by_method = routes.entry(path.to_string()).or_default();
        if let Some(dup) = methods.iter().find(|m| by_method.contains_key(*m)) {
            return Err(ApiError::DuplicateRoute {
                method: dup.clone(),
                path: path.to_string(),
            });
        }
        for m in methods {
            by_method.insert(m, Arc::clone(&handler));
        }
        Ok(())
    }

    fn routes(&self) -> Vec<(String, String)> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes
            .iter()
            .flat_map(|(path, by_method)| by_method.keys().map(|m| (m.clone(), path.clone())))
            .collect()
    }

    fn dispatch(&self, method: &str, path: &str, body: &[u8]) -> Response {
        let method = method.to_ascii_uppercase();
        let handler = {
            let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
            let Some(by_method) = routes.get(path) else {
                return Response::status(404);
            };
            match by_method.get(&method).or_else(|| by_method.get(ANY)) {
                Some(h) => Arc::clone(h),
                None => return Response::status(405),
            }
        };

        let req = Request {
            method,
            path: path.to_string(),
            body: body.to_vec(),
        };
        handler(&req)
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes())
            .finish()
    }
}
