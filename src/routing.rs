//! Route table: binds URL path patterns to handlers.
//!
//! Matching follows the usual multiplexer rules:
//! - A pattern without a trailing slash (`/users`) matches that path only.
//! - A pattern with a trailing slash (`/users/`) matches itself and every
//!   path beneath it.
//! - When several patterns match, the longest one wins.
//!
//! The table is filled before the listener starts and is read-only while
//! serving, so it is shared behind an `Arc` without locking.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL, LOCATION};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::request_id_layer;

/// Body sent when no pattern matches the request path.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Default Cache-Control for dispatched responses. Handlers may override it.
pub const CACHE_CONTROL_DYNAMIC: &str = "no-store";

/// Something that can answer an HTTP request.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: Request) -> Response;
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid route pattern {0:?}: patterns must start with '/'")]
    InvalidPattern(String),
}

/// Pattern to handler bindings.
#[derive(Default, Clone)]
pub struct RouteTable {
    routes: BTreeMap<String, Arc<dyn Handler>>,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("patterns", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `pattern`, replacing any earlier binding of the
    /// same pattern.
    pub fn register(
        &mut self,
        pattern: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let pattern = pattern.into();
        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern(pattern));
        }

        if self.routes.insert(pattern.clone(), handler).is_some() {
            tracing::warn!(%pattern, "Route re-registered, previous handler replaced");
        } else {
            tracing::debug!(%pattern, "Route registered");
        }
        Ok(())
    }

    /// Registered patterns in sorted order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the handler for `path` using longest-pattern matching.
    pub fn resolve(&self, path: &str) -> Option<Arc<dyn Handler>> {
        if let Some(handler) = self.routes.get(path) {
            return Some(Arc::clone(handler));
        }

        self.routes
            .iter()
            .filter(|(pattern, _)| pattern.ends_with('/') && path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, handler)| Arc::clone(handler))
    }

    /// Route `request` to its handler.
    ///
    /// An exact pattern match wins outright. Otherwise a path that only misses
    /// the trailing slash of a registered subtree is redirected to it, before
    /// any shorter subtree gets a chance to claim it. Unmatched paths get a 404.
    pub async fn dispatch(&self, request: Request) -> Response {
        let path = request.uri().path();

        if let Some(handler) = self.routes.get(path).map(Arc::clone) {
            return handler.handle(request).await;
        }

        if let Some(location) = self.subtree_redirect(&request) {
            tracing::debug!(%location, "Redirecting to subtree root");
            return (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response();
        }

        if let Some(handler) = self.resolve(path) {
            return handler.handle(request).await;
        }

        tracing::debug!(path = %path, "No route matched");
        (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
    }

    fn subtree_redirect(&self, request: &Request) -> Option<String> {
        let uri = request.uri();
        let subtree = format!("{}/", uri.path());
        if !self.routes.contains_key(&subtree) {
            return None;
        }

        Some(match uri.query() {
            Some(query) => format!("{}?{}", subtree, query),
            None => subtree,
        })
    }

    /// Build the axum router that dispatches every request through this table.
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(dispatch_request)
            .with_state(Arc::new(self))
            .layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static(CACHE_CONTROL_DYNAMIC),
            ))
            // Outermost, so the request span covers everything below
            .layer(middleware::from_fn(request_id_layer))
    }
}

async fn dispatch_request(State(routes): State<Arc<RouteTable>>, request: Request) -> Response {
    routes.dispatch(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named(&'static str);

    #[async_trait]
    impl Handler for Named {
        async fn handle(&self, _request: Request) -> Response {
            self.0.into_response()
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl Handler for Counting {
        async fn handle(&self, _request: Request) -> Response {
            self.0.fetch_add(1, Ordering::SeqCst);
            StatusCode::NO_CONTENT.into_response()
        }
    }

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn resolved_name(table: &RouteTable, path: &str) -> Option<String> {
        match table.resolve(path) {
            Some(handler) => Some(body_text(handler.handle(request(path)).await).await),
            None => None,
        }
    }

    #[test]
    fn test_register_rejects_relative_pattern() {
        let mut table = RouteTable::new();
        let err = table.register("users", Arc::new(Named("users"))).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern(p) if p == "users"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_register_rejects_empty_pattern() {
        let mut table = RouteTable::new();
        assert!(table.register("", Arc::new(Named("empty"))).is_err());
    }

    #[test]
    fn test_exact_pattern_does_not_match_children() {
        let mut table = RouteTable::new();
        table.register("/users", Arc::new(Named("users"))).unwrap();

        assert!(table.resolve("/users").is_some());
        assert!(table.resolve("/users/42").is_none());
        assert!(table.resolve("/users-archive").is_none());
    }

    #[test]
    fn test_subtree_pattern_matches_children() {
        let mut table = RouteTable::new();
        table.register("/users/", Arc::new(Named("users"))).unwrap();

        assert!(table.resolve("/users/").is_some());
        assert!(table.resolve("/users/42").is_some());
        assert!(table.resolve("/users/42/posts").is_some());
        assert!(table.resolve("/users").is_none());
    }

    #[tokio::test]
    async fn test_longest_pattern_wins() {
        let mut table = RouteTable::new();
        table.register("/", Arc::new(Named("root"))).unwrap();
        table.register("/users/", Arc::new(Named("users"))).unwrap();
        table.register("/users/admin/", Arc::new(Named("admin"))).unwrap();

        assert_eq!(resolved_name(&table, "/other").await.as_deref(), Some("root"));
        assert_eq!(resolved_name(&table, "/users/7").await.as_deref(), Some("users"));
        assert_eq!(
            resolved_name(&table, "/users/admin/7").await.as_deref(),
            Some("admin")
        );
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut table = RouteTable::new();
        table.register("/users", Arc::new(Named("first"))).unwrap();
        table.register("/users", Arc::new(Named("second"))).unwrap();

        assert_eq!(table.patterns().count(), 1);
        assert_eq!(resolved_name(&table, "/users").await.as_deref(), Some("second"));
    }

    #[test]
    fn test_shared_handler_keeps_identity() {
        let shared: Arc<dyn Handler> = Arc::new(Named("users"));
        let mut table = RouteTable::new();
        table.register("/users", Arc::clone(&shared)).unwrap();
        table.register("/users/", Arc::clone(&shared)).unwrap();

        let exact = table.resolve("/users").unwrap();
        let subtree = table.resolve("/users/9").unwrap();
        assert!(Arc::ptr_eq(&exact, &shared));
        assert!(Arc::ptr_eq(&subtree, &shared));
    }

    #[tokio::test]
    async fn test_dispatch_invokes_only_matching_handler_once() {
        let users = Arc::new(Counting::default());
        let other = Arc::new(Counting::default());
        let mut table = RouteTable::new();
        table.register("/users", users.clone()).unwrap();
        table.register("/other", other.clone()).unwrap();

        let response = table.dispatch(request("/users")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(users.0.load(Ordering::SeqCst), 1);
        assert_eq!(other.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_path_is_not_found() {
        let users = Arc::new(Counting::default());
        let mut table = RouteTable::new();
        table.register("/users", users.clone()).unwrap();

        let response = table.dispatch(request("/unknown-path")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, NOT_FOUND_BODY);
        assert_eq!(users.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatch_redirects_to_subtree_root() {
        let users = Arc::new(Counting::default());
        let mut table = RouteTable::new();
        table.register("/users/", users.clone()).unwrap();

        let response = table.dispatch(request("/users?page=2")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/users/?page=2"
        );
        assert_eq!(users.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_redirect_beats_shorter_subtree() {
        let root = Arc::new(Counting::default());
        let section = Arc::new(Counting::default());
        let mut table = RouteTable::new();
        table.register("/", root.clone()).unwrap();
        table.register("/x/", section.clone()).unwrap();

        let response = table.dispatch(request("/x")).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/x/");
        assert_eq!(root.0.load(Ordering::SeqCst), 0);
        assert_eq!(section.0.load(Ordering::SeqCst), 0);

        table.dispatch(request("/x/1")).await;
        table.dispatch(request("/y")).await;
        assert_eq!(section.0.load(Ordering::SeqCst), 1);
        assert_eq!(root.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exact_pattern_beats_redirect() {
        let users = Arc::new(Counting::default());
        let mut table = RouteTable::new();
        table.register("/users", users.clone()).unwrap();
        table.register("/users/", Arc::new(Named("subtree"))).unwrap();

        let response = table.dispatch(request("/users")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(users.0.load(Ordering::SeqCst), 1);
    }
}
