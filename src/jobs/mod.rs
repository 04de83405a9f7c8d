//! # Sistema de Jobs
//!
//! Cada `POST /run` crea un job que se ejecuta en su propio thread.
//!
//! ## Endpoints
//!
//! - `POST /run` - Subir imágenes y crear el job
//! - `GET /status/{job_id}` - Consultar estado
//! - `GET /health` - Chequeo de vida

pub mod command;
pub mod handlers;
pub mod manager;
pub mod registry;
pub mod runner;
pub mod types;

pub use manager::{JobManager, JobManagerConfig, Upload};
pub use registry::JobRegistry;
pub use types::{Job, JobStatus};
