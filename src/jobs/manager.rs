//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Guarda las imágenes de cada upload, registra el job y lanza un thread por
//! job que ejecuta `SEG3D_CMD`. No hay cola ni límite de concurrencia.
//!
//! ```text
//! {runs_dir}/{job_id}/images/<archivos subidos>
//! {results_dir}/{job_id}.glb
//! ```

use crate::config::Config;
use crate::error::{Result, SubmitError};
use crate::jobs::registry::JobRegistry;
use crate::jobs::runner::Seg3dRunner;
use crate::jobs::types::Job;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use uuid::Uuid;

/// Longitud del ID de un job (hex)
pub const JOB_ID_LEN: usize = 10;

/// Un archivo recibido en `POST /run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Configuración del Job Manager
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    pub runs_dir: PathBuf,
    pub results_dir: PathBuf,

    /// Plantilla de SEG3D_CMD capturada al arrancar
    pub command: Option<String>,

    /// 0 = sin timeout
    pub timeout_secs: u64,
}

impl JobManagerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        Self {
            runs_dir: config.runs_dir.clone(),
            results_dir: config.results_dir.clone(),
            command: config.seg3d_cmd.clone(),
            timeout_secs: config.job_timeout_secs,
        }
    }
}

/// Gestor central de jobs
pub struct JobManager {
    config: JobManagerConfig,
    registry: JobRegistry,
    runner: Seg3dRunner,
}

impl JobManager {
    /// Crea el manager y los directorios de trabajo
    pub fn new(config: JobManagerConfig) -> Result<Self> {
        fs::create_dir_all(&config.runs_dir)?;
        fs::create_dir_all(&config.results_dir)?;

        let runner = Seg3dRunner::new(config.command.clone(), config.timeout_secs);
        Ok(Self {
            config,
            registry: JobRegistry::new(),
            runner,
        })
    }

    /// Registra un job nuevo y lanza su worker
    ///
    /// Retorna el ID del job. Los archivos se escriben antes de que arranque
    /// el comando.
    pub fn submit(&self, uploads: Vec<Upload>) -> std::result::Result<String, SubmitError> {
        if uploads.is_empty() {
            return Err(SubmitError::NoImages);
        }

        let job_id = self.register_new_job();
        let input_dir = self.config.runs_dir.join(&job_id).join("images");
        let output_glb = self.config.results_dir.join(format!("{}.glb", job_id));

        if let Err(e) = store_uploads(&input_dir, &uploads) {
            tracing::error!(job_id = %job_id, error = %e, "failed to store uploads");
            self.registry.update(&job_id, |job| job.mark_failed(e.to_string()));
            return Err(e.into());
        }

        tracing::info!(
            job_id = %job_id,
            files = uploads.len(),
            input_dir = %input_dir.display(),
            "job queued"
        );

        let registry = self.registry.clone();
        let runner = self.runner.clone();
        let worker_id = job_id.clone();
        let spawned = thread::Builder::new()
            .name(format!("seg3d-{}", job_id))
            .spawn(move || Self::execute(&registry, &runner, &worker_id, &input_dir, &output_glb));

        if let Err(e) = spawned {
            tracing::error!(job_id = %job_id, error = %e, "failed to spawn worker thread");
            self.registry.update(&job_id, |job| job.mark_failed(e.to_string()));
            return Err(e.into());
        }

        Ok(job_id)
    }

    /// Copia del estado actual del job
    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.registry.get(job_id)
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn config(&self) -> &JobManagerConfig {
        &self.config
    }

    /// Inserta un job con un ID libre
    fn register_new_job(&self) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string()[..JOB_ID_LEN].to_string();
            if self.registry.insert(Job::new(id.clone())) {
                return id;
            }
        }
    }

    /// Cuerpo del worker: running → done | failed
    fn execute(
        registry: &JobRegistry,
        runner: &Seg3dRunner,
        job_id: &str,
        input_dir: &Path,
        output_glb: &Path,
    ) {
        registry.update(job_id, |job| job.mark_running());
        let waited = registry.get(job_id).and_then(|job| job.wait_secs());
        tracing::info!(job_id = %job_id, wait_secs = ?waited, "job running");

        match runner.run(input_dir, output_glb) {
            Ok(()) => {
                let file_name = output_glb
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("{}.glb", job_id));
                registry.update(job_id, |job| job.mark_done(format!("/results/{}", file_name)));
                tracing::info!(
                    job_id = %job_id,
                    output = %output_glb.display(),
                    run_secs = ?run_secs(registry, job_id),
                    "job done"
                );
            }
            Err(e) => {
                registry.update(job_id, |job| job.mark_failed(e.to_string()));
                tracing::warn!(
                    job_id = %job_id,
                    error = %e,
                    run_secs = ?run_secs(registry, job_id),
                    "job failed"
                );
            }
        }
    }
}

fn run_secs(registry: &JobRegistry, job_id: &str) -> Option<u64> {
    registry.get(job_id).and_then(|job| job.run_secs())
}

fn store_uploads(input_dir: &Path, uploads: &[Upload]) -> std::io::Result<()> {
    fs::create_dir_all(input_dir)?;
    for upload in uploads {
        let target = input_dir.join(safe_filename(upload.filename.as_deref()));
        fs::write(&target, &upload.data)?;
    }
    Ok(())
}

/// Nombre de archivo seguro dentro del directorio del job
///
/// Se queda con el último componente del nombre enviado; si no queda nada
/// útil usa `image_<hex>.jpg`.
///
/// # Ejemplo
/// ```
/// use seg3d_server::jobs::manager::safe_filename;
///
/// assert_eq!(safe_filename(Some("../../etc/passwd")), "passwd");
/// assert!(safe_filename(None).starts_with("image_"));
/// ```
pub fn safe_filename(name: Option<&str>) -> String {
    let candidate = name
        .and_then(|n| n.rsplit(['/', '\\']).next())
        .map(str::trim)
        .unwrap_or_default();

    if candidate.is_empty() || candidate == "." || candidate == ".." {
        format!("image_{}.jpg", Uuid::new_v4().simple())
    } else {
        candidate.to_string()
    }
}
