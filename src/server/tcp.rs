//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor TCP que maneja múltiples conexiones simultáneas usando threads:
//! cada conexión se procesa en su propio thread y se cierra después de
//! responder (HTTP/1.0).

use crate::config::Config;
use crate::error::Result;
use crate::http::request::ReadError;
use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::handlers as job_handlers;
use crate::results;
use crate::router::Router;
use crate::server::AppState;
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Tiempo máximo de espera por datos del cliente
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Métodos anunciados en el preflight de CORS
const CORS_METHODS: &str = "GET, HEAD, POST, OPTIONS";

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    state: Arc<AppState>,
    router: Arc<Router<AppState>>,
    listener: TcpListener,
}

impl Server {
    /// Valida la configuración, prepara directorios y hace bind
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.address())?;
        Self::with_listener(config, listener)
    }

    /// Usa un listener ya abierto (p. ej. puerto efímero en tests)
    pub fn with_listener(config: Config, listener: TcpListener) -> Result<Self> {
        let state = AppState::new(config)?;
        tracing::info!(address = ?listener.local_addr().ok(), "server listening");

        Ok(Self {
            state: Arc::new(state),
            router: Arc::new(Self::build_router()),
            listener,
        })
    }

    /// Tabla de rutas del API
    pub fn build_router() -> Router<AppState> {
        let mut router = Router::new();
        router.register(Method::GET, "/health", job_handlers::health_handler);
        router.register(Method::POST, "/run", job_handlers::run_handler);
        router.register_prefix(Method::GET, "/status/", job_handlers::status_handler);
        router.register_prefix(Method::GET, "/results/", results::results_handler);
        router
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Acepta conexiones para siempre: un thread por conexión
    pub fn run(&self) -> Result<()> {
        tracing::info!("concurrent mode: one thread per connection");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = Arc::clone(&self.router);
                    let state = Arc::clone(&self.state);

                    let peer = stream
                        .peer_addr()
                        .map(|addr| addr.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    tracing::debug!(peer = %peer, "new connection");

                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(stream, &router, &state) {
                            tracing::warn!(peer = %peer, error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                }
            }
        }

        Ok(())
    }

    /// Lee un request, lo despacha y escribe la respuesta
    fn handle_connection(
        mut stream: TcpStream,
        router: &Router<AppState>,
        state: &AppState,
    ) -> std::io::Result<()> {
        let start = Instant::now();
        let request_id = Uuid::new_v4().simple().to_string();
        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let (mut response, method, path) =
            match Request::read_from(&mut stream, state.config.max_upload_bytes) {
                Ok(request) => {
                    let response = Self::dispatch(&request, router, state);
                    (response, request.method().as_str(), request.path().to_string())
                }
                Err(ReadError::Closed) => return Ok(()),
                Err(ReadError::Io(e)) => return Err(e),
                Err(e) => (Self::read_error_response(&e), "-", "-".to_string()),
            };

        response.add_header("X-Request-Id", &request_id);
        response.add_header("Server", "Seg3D-HTTP/1.0");
        response.add_header("Connection", "close");

        stream.write_all(&response.to_bytes())?;
        stream.flush()?;

        tracing::info!(
            request_id = %&request_id[..8],
            method,
            path = %path,
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "request"
        );

        Ok(())
    }

    /// Enruta el request y agrega CORS
    fn dispatch(request: &Request, router: &Router<AppState>, state: &AppState) -> Response {
        let origins = &state.config.cors_origins;

        if request.method() == Method::OPTIONS
            && request.header("origin").is_some()
            && request.header("access-control-request-method").is_some()
        {
            return Self::preflight(request, origins);
        }

        let mut response = router.route(request, state);
        if request.method() == Method::HEAD {
            response = response.without_body();
        }
        Self::apply_cors(request, &mut response, origins);
        response
    }

    /// Respuesta a un preflight de CORS
    fn preflight(request: &Request, origins: &[String]) -> Response {
        let origin = request.header("origin").unwrap_or_default();
        if !origins.iter().any(|o| o == origin) {
            return Response::new(StatusCode::BadRequest)
                .with_header("Content-Type", "text/plain; charset=utf-8")
                .with_body_bytes(b"Disallowed CORS origin".to_vec());
        }

        let mut response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_header("Access-Control-Allow-Methods", CORS_METHODS)
            .with_header("Access-Control-Max-Age", "600")
            .with_body_bytes(b"OK".to_vec());
        if let Some(headers) = request.header("access-control-request-headers") {
            response.add_header("Access-Control-Allow-Headers", headers);
        }
        Self::apply_cors(request, &mut response, origins);
        response
    }

    fn apply_cors(request: &Request, response: &mut Response, origins: &[String]) {
        if let Some(origin) = request.header("origin") {
            if origins.iter().any(|o| o == origin) {
                response.add_header("Access-Control-Allow-Origin", origin);
                response.add_header("Access-Control-Allow-Credentials", "true");
                response.add_header("Vary", "Origin");
            }
        }
    }

    fn read_error_response(error: &ReadError) -> Response {
        use crate::http::request::ParseError;

        match error {
            ReadError::BodyTooLarge { .. } | ReadError::HeadersTooLarge => {
                Response::error(StatusCode::PayloadTooLarge, &error.to_string())
            }
            ReadError::Parse(ParseError::UnsupportedMethod(_)) => {
                Response::error(StatusCode::MethodNotAllowed, "Method Not Allowed")
            }
            _ => Response::error(StatusCode::BadRequest, &format!("Invalid: {}", error)),
        }
    }
}
