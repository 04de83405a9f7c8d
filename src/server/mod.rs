//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee y parsea requests HTTP, incluyendo uploads multipart
//! 4. Genera y envía responses HTTP con CORS
//!
//! El estado compartido entre conexiones vive en [`AppState`].

pub mod tcp;

use crate::config::Config;
use crate::error::Result;
use crate::jobs::{JobManager, JobManagerConfig};

// Re-exportar para facilitar el uso
pub use tcp::Server;

/// Estado compartido por todos los handlers
pub struct AppState {
    pub config: Config,
    pub jobs: JobManager,
}

impl AppState {
    /// Crea el estado y los directorios de runs/results
    pub fn new(config: Config) -> Result<Self> {
        let jobs = JobManager::new(JobManagerConfig::from_config(&config))?;
        Ok(Self { config, jobs })
    }
}
