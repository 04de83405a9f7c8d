//! # Seg3D Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.0.
//!
//! La configuración viene de argumentos CLI o variables de entorno
//! (ver `config.rs`). El nivel de log se controla con `RUST_LOG`.

use seg3d_server::config::Config;
use seg3d_server::server::Server;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Seg3D HTTP/1.0 server starting");

    let config = Config::new();
    config.log_summary();

    let server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    // Esto bloquea el thread principal
    if let Err(e) = server.run() {
        tracing::error!(error = %e, "fatal server error");
        std::process::exit(1);
    }
}
