//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea método + path a handlers.
//!
//! ```text
//! Request → Router → Handler(&Request, &State) → Response
//! ```
//!
//! Las rutas pueden ser exactas (`/health`) o por prefijo (`/status/`), y en
//! ese caso el handler lee el resto del path. Un path conocido con un método
//! no registrado da 405; un path desconocido da 404.

use crate::http::{Method, Request, Response, StatusCode};

/// Un handler recibe el Request y el estado compartido y retorna una Response
pub type Handler<S> = fn(&Request, &S) -> Response;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => p == path,
            Pattern::Prefix(p) => path.len() > p.len() && path.starts_with(p.as_str()),
        }
    }
}

/// Router que mapea (método, path) a handlers
pub struct Router<S> {
    routes: Vec<(Method, Pattern, Handler<S>)>,
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta exacta
    pub fn register(&mut self, method: Method, path: &str, handler: Handler<S>) {
        self.routes.push((method, Pattern::Exact(path.to_string()), handler));
    }

    /// Registra una ruta por prefijo; el prefijo debe terminar en `/`
    pub fn register_prefix(&mut self, method: Method, prefix: &str, handler: Handler<S>) {
        self.routes.push((method, Pattern::Prefix(prefix.to_string()), handler));
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// `HEAD` usa el handler de `GET`; quitar el body es cosa del servidor.
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let path = request.path();
        let wanted = match request.method() {
            Method::HEAD => Method::GET,
            m => m,
        };

        let mut allowed: Vec<&'static str> = Vec::new();
        for (method, pattern, handler) in &self.routes {
            if !pattern.matches(path) {
                continue;
            }
            if *method == wanted {
                return handler(request, state);
            }
            allowed.push(method.as_str());
            if *method == Method::GET {
                allowed.push(Method::HEAD.as_str());
            }
        }

        if allowed.is_empty() {
            Response::error(StatusCode::NotFound, "Not Found")
        } else {
            Response::error(StatusCode::MethodNotAllowed, "Method Not Allowed")
                .with_header("Allow", &allowed.join(", "))
        }
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hello_handler(_req: &Request, greeting: &String) -> Response {
        Response::json(StatusCode::Ok, &json!({ "message": greeting }))
    }

    fn echo_tail_handler(req: &Request, _state: &String) -> Response {
        let tail = req.path().strip_prefix("/items/").unwrap_or_default();
        Response::json(StatusCode::Ok, &json!({ "item": tail }))
    }

    fn router() -> Router<String> {
        let mut router = Router::new();
        router.register(Method::GET, "/hello", hello_handler);
        router.register_prefix(Method::GET, "/items/", echo_tail_handler);
        router
    }

    fn send(router: &Router<String>, raw: &[u8]) -> Response {
        let request = Request::parse(raw).unwrap();
        router.route(&request, &"hola".to_string())
    }

    #[test]
    fn test_route_found_uses_state() {
        let response = send(&router(), b"GET /hello HTTP/1.0\r\n\r\n");

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), br#"{"message":"hola"}"#);
        assert_eq!(response.header("Server"), None);
    }

    #[test]
    fn test_prefix_route() {
        let response = send(&router(), b"GET /items/abc HTTP/1.0\r\n\r\n");
        assert_eq!(response.body(), br#"{"item":"abc"}"#);
    }

    #[test]
    fn test_prefix_requires_tail() {
        let response = send(&router(), b"GET /items/ HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_head_uses_get_handler() {
        let response = send(&router(), b"HEAD /hello HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::Ok);
    }

    #[test]
    fn test_route_not_found() {
        let response = send(&router(), b"GET /nonexistent HTTP/1.0\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body(), br#"{"detail":"Not Found"}"#);
    }

    #[test]
    fn test_method_not_allowed() {
        let response = send(&router(), b"POST /hello HTTP/1.0\r\n\r\n");

        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
        assert_eq!(response.header("Allow"), Some("GET, HEAD"));
    }
}
