//! # Tipos del Sistema de Jobs
//! src/jobs/types.rs
//!
//! Un job es una conversión imágenes → malla. Su estado avanza en una sola
//! dirección: `queued → running → (done | failed)`.

use serde::{Deserialize, Serialize};

/// Estado de un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job registrado, el worker aún no arranca
    Queued,

    /// El comando externo se está ejecutando
    Running,

    /// Malla generada
    Done,

    /// El comando falló o no hay configuración
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

/// Un job con su estado actual
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// ID hexadecimal de 10 caracteres
    pub id: String,

    pub status: JobStatus,

    /// Mensaje legible (o el error capturado cuando falla)
    pub message: String,

    /// Path relativo del resultado (`/results/{id}.glb`) cuando está done
    pub mesh_path: Option<String>,

    pub created_at: u64,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
}

impl Job {
    pub fn new(id: String) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            message: "Queued".to_string(),
            mesh_path: None,
            created_at: now_secs(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Marca el job como iniciado
    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
        self.message = "Running".to_string();
        self.started_at = Some(now_secs());
    }

    /// Marca el job como completado
    pub fn mark_done(&mut self, mesh_path: String) {
        self.status = JobStatus::Done;
        self.message = "Completed".to_string();
        self.mesh_path = Some(mesh_path);
        self.finished_at = Some(now_secs());
    }

    /// Marca el job como fallido
    pub fn mark_failed(&mut self, message: String) {
        self.status = JobStatus::Failed;
        self.message = message;
        self.finished_at = Some(now_secs());
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Done | JobStatus::Failed)
    }

    /// Segundos entre creación e inicio
    pub fn wait_secs(&self) -> Option<u64> {
        self.started_at.map(|s| s.saturating_sub(self.created_at))
    }

    /// Segundos de ejecución, cuando ya terminó
    pub fn run_secs(&self) -> Option<u64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }
}

/// Payload de `GET /status/{job_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
    pub mesh_url: Option<String>,
}

impl StatusPayload {
    /// Construye el payload; `mesh_url` se vuelve absoluta con `public_base`
    pub fn from_job(job: &Job, public_base: &str) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status,
            message: job.message.clone(),
            mesh_url: job
                .mesh_path
                .as_ref()
                .map(|path| format!("{}{}", public_base, path)),
        }
    }
}

/// Payload de `POST /run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub job_id: String,
    pub status_url: String,
}

impl SubmitPayload {
    pub fn new(job_id: String) -> Self {
        let status_url = format!("/status/{}", job_id);
        Self { job_id, status_url }
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
