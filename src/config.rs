//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor Seg3D con soporte completo para argumentos CLI
//! y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./seg3d_server --port 8000 \
//!   --runs-dir ./runs \
//!   --results-dir ./results \
//!   --job-timeout-secs 600
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! SEG3D_CMD="python run.py --input {input_dir} --output {output_glb}" \
//!   HTTP_PORT=8000 ./seg3d_server
//! ```

use crate::error::ServerError;
use clap::Parser;
use std::path::PathBuf;

/// Orígenes permitidos por defecto para CORS
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:8000",
    "http://127.0.0.1:8000",
    "https://yfcosmos.com",
    "https://colinfirth5566.github.io",
];

/// Configuración del servidor Seg3D
#[derive(Debug, Clone, Parser)]
#[command(name = "seg3d_server")]
#[command(about = "Servidor HTTP/1.0 que convierte imágenes subidas en una malla 3D vía SEG3D_CMD")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Directorios ===

    /// Directorio donde se guardan las imágenes de cada job
    #[arg(long = "runs-dir", default_value = "./runs", env = "RUNS_DIR")]
    pub runs_dir: PathBuf,

    /// Directorio de salida servido en /results
    #[arg(long = "results-dir", default_value = "./results", env = "RESULTS_DIR")]
    pub results_dir: PathBuf,

    // === Comando externo ===

    /// Plantilla del comando de reconstrucción ({input_dir}, {output_glb})
    #[arg(long = "seg3d-cmd", env = "SEG3D_CMD")]
    pub seg3d_cmd: Option<String>,

    /// Timeout del comando en segundos (0 = sin límite)
    #[arg(long = "job-timeout-secs", default_value = "0", env = "JOB_TIMEOUT_SECS")]
    pub job_timeout_secs: u64,

    // === HTTP ===

    /// URL pública usada para construir `mesh_url`
    #[arg(long = "public-url", default_value = "http://localhost:8000", env = "PUBLIC_URL")]
    pub public_url: String,

    /// Orígenes permitidos para CORS (separados por coma)
    #[arg(
        long = "cors-origins",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect::<Vec<_>>()
    )]
    pub cors_origins: Vec<String>,

    /// Tamaño máximo del body de un request
    #[arg(long = "max-upload-bytes", default_value = "268435456", env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use seg3d_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port == 0 {
            return Err(ServerError::Config("port must be >= 1".to_string()));
        }
        if self.runs_dir.as_os_str().is_empty() {
            return Err(ServerError::Config("runs dir must not be empty".to_string()));
        }
        if self.results_dir.as_os_str().is_empty() {
            return Err(ServerError::Config("results dir must not be empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config("max upload bytes must be > 0".to_string()));
        }
        if !(self.public_url.starts_with("http://") || self.public_url.starts_with("https://")) {
            return Err(ServerError::Config(format!(
                "public url must start with http:// or https:// (got {})",
                self.public_url
            )));
        }
        Ok(())
    }

    /// URL pública sin la barra final
    pub fn public_base(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(address = %self.address(), "network");
        tracing::info!(
            runs_dir = %self.runs_dir.display(),
            results_dir = %self.results_dir.display(),
            "directories"
        );
        tracing::info!(
            configured = self.seg3d_cmd.as_deref().is_some_and(|c| !c.trim().is_empty()),
            timeout_secs = self.job_timeout_secs,
            "SEG3D_CMD"
        );
        tracing::info!(
            public_url = %self.public_url,
            cors_origins = ?self.cors_origins,
            max_upload_bytes = self.max_upload_bytes,
            "http"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8000,
            host: "127.0.0.1".to_string(),
            runs_dir: PathBuf::from("./runs"),
            results_dir: PathBuf::from("./results"),
            seg3d_cmd: None,
            job_timeout_secs: 0,
            public_url: "http://localhost:8000".to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            max_upload_bytes: 256 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.runs_dir, PathBuf::from("./runs"));
        assert_eq!(config.results_dir, PathBuf::from("./results"));
        assert!(config.seg3d_cmd.is_none());
        assert_eq!(config.job_timeout_secs, 0);
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = Config::default();
        config.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_validate_empty_dirs() {
        let mut config = Config::default();
        config.runs_dir = PathBuf::new();
        assert!(config.validate().unwrap_err().to_string().contains("runs dir"));

        let mut config = Config::default();
        config.results_dir = PathBuf::new();
        assert!(config.validate().unwrap_err().to_string().contains("results dir"));
    }

    #[test]
    fn test_validate_upload_limit() {
        let mut config = Config::default();
        config.max_upload_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_public_url() {
        let mut config = Config::default();
        config.public_url = "localhost:8000".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("public url"));

        config.public_url = "https://seg3d.example.com/".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.public_base(), "https://seg3d.example.com");
    }

    #[test]
    fn test_default_cors_origins() {
        let config = Config::default();
        assert_eq!(config.cors_origins.len(), 4);
        assert!(config.cors_origins.contains(&"https://yfcosmos.com".to_string()));
    }

    #[test]
    fn test_parse_cli_args() {
        let config = Config::try_parse_from([
            "seg3d_server",
            "--port",
            "9000",
            "--seg3d-cmd",
            "cp {input_dir}/a {output_glb}",
            "--cors-origins",
            "http://a.test,http://b.test",
            "--job-timeout-secs",
            "30",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.seg3d_cmd.as_deref(), Some("cp {input_dir}/a {output_glb}"));
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.job_timeout_secs, 30);
    }

    #[test]
    fn test_log_summary() {
        // No debe hacer panic
        Config::default().log_summary();
    }
}
