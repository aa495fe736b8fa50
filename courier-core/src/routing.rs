// Routing system for HTTP requests

use crate::{Error, HttpMethod, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A route handler function type
pub type HandlerFn = Arc<
    dyn Fn(HttpRequest) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>
        + Send
        + Sync,
>;

/// Route definition with handler
#[derive(Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub handler: HandlerFn,
}

/// Router for managing routes and dispatching requests
#[derive(Clone, Default)]
pub struct Router {
    pub routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add a route to the router
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Register an async closure for `method path`
    pub fn on<F, Fut>(&mut self, method: HttpMethod, path: impl Into<String>, handler: F)
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        let handler: HandlerFn = Arc::new(move |req| Box::pin(handler(req)));
        self.add_route(Route {
            method,
            path: path.into(),
            handler,
        });
    }

    /// Paths of all registered routes, in registration order
    pub fn paths(&self) -> Vec<(HttpMethod, &str)> {
        self.routes
            .iter()
            .map(|r| (r.method, r.path.as_str()))
            .collect()
    }

    /// Find a route that matches the request
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let (path, query_string) = match request.path.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (request.path.clone(), None),
        };

        if let Some(query) = query_string {
            request.query_params = parse_query_string(&query);
        }

        let mut path_matched = false;
        for route in &self.routes {
            let Some(params) = match_path(&route.path, &path) else {
                continue;
            };
            if !route.method.as_str().eq_ignore_ascii_case(&request.method) {
                path_matched = true;
                continue;
            }
            request.path_params = params;
            return (route.handler)(request).await;
        }

        if path_matched {
            Err(Error::MethodNotAllowed(format!("{} {}", request.method, path)))
        } else {
            Err(Error::RouteNotFound(format!("{} {}", request.method, path)))
        }
    }
}

/// Match a route path pattern against a request path
/// Returns Some(params) if matched, None otherwise
fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pattern_part.strip_prefix(':') {
            params.insert(param_name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    Some(params)
}

/// Parse a query string into a map of parameters
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (part.to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_router() -> Router {
        let mut router = Router::new();
        router.on(HttpMethod::POST, "/push/v1/devices/:device/registrations/:website", |req| async move {
            let body = format!(
                "{}:{}",
                req.param("device").unwrap_or_default(),
                req.param("website").unwrap_or_default()
            );
            Ok(HttpResponse::text(body))
        });
        router
    }

    #[test]
    fn test_match_path_with_params() {
        let params = match_path("/v1/devices/:device/registrations/:website", "/v1/devices/abc/registrations/web.com.example").unwrap();
        assert_eq!(params.get("device"), Some(&"abc".to_string()));
        assert_eq!(params.get("website"), Some(&"web.com.example".to_string()));
    }

    #[test]
    fn test_match_path_no_match() {
        assert!(match_path("/users/:id", "/posts/123").is_none());
        assert!(match_path("/users/:id", "/users/123/extra").is_none());
    }

    #[test]
    fn test_parse_query_string() {
        let params = parse_query_string("name=john&flag");
        assert_eq!(params.get("name"), Some(&"john".to_string()));
        assert_eq!(params.get("flag"), Some(&String::new()));
        assert!(parse_query_string("").is_empty());
    }

    #[tokio::test]
    async fn test_route_dispatches_with_params() {
        let router = echo_router();
        let resp = router
            .route(HttpRequest::new("POST", "/push/v1/devices/d1/registrations/w1"))
            .await
            .unwrap();
        assert_eq!(resp.body, b"d1:w1".to_vec());
    }

    #[tokio::test]
    async fn test_route_ignores_query_when_matching() {
        let mut router = Router::new();
        router.on(HttpMethod::POST, "/push/v1/log", |req| async move {
            Ok(HttpResponse::text(req.query("tenant").unwrap_or("none").to_string()))
        });

        let resp = router
            .route(HttpRequest::new("POST", "/push/v1/log?tenant=acme"))
            .await
            .unwrap();
        assert_eq!(resp.body, b"acme".to_vec());

        let resp = router
            .route(HttpRequest::new("POST", "/push/v1/log"))
            .await
            .unwrap();
        assert_eq!(resp.body, b"none".to_vec());
    }

    #[tokio::test]
    async fn test_route_method_not_allowed() {
        let router = echo_router();
        let err = router
            .route(HttpRequest::new("GET", "/push/v1/devices/d1/registrations/w1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MethodNotAllowed(_)));
    }

    #[tokio::test]
    async fn test_route_not_found() {
        let router = echo_router();
        let err = router
            .route(HttpRequest::new("POST", "/elsewhere"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_router_paths() {
        let router = echo_router();
        assert_eq!(router.paths().len(), 1);
        assert_eq!(router.paths()[0].0, HttpMethod::POST);
    }
}
