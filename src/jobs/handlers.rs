//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! - `POST /run` → `{job_id, status_url}`
//! - `GET /status/{job_id}` → `{job_id, status, message, mesh_url}`
//! - `GET /health` → `{status: "ok"}`

use crate::error::SubmitError;
use crate::http::multipart::{self, MultipartError};
use crate::http::{Request, Response, StatusCode};
use crate::jobs::manager::Upload;
use crate::jobs::types::{StatusPayload, SubmitPayload};
use crate::server::AppState;
use serde_json::json;

/// Campos de formulario aceptados como imágenes, en orden de prioridad
pub const IMAGE_FIELDS: &[&str] = &["images[]", "images", "image"];

/// Handler para `POST /run`
///
/// Acepta `multipart/form-data` con uno o más archivos en `images[]`,
/// `images` o `image`.
///
/// # Ejemplo de response
/// ```json
/// {"job_id": "3f9a0c1b2d", "status_url": "/status/3f9a0c1b2d"}
/// ```
pub fn run_handler(req: &Request, state: &AppState) -> Response {
    let uploads = match collect_uploads(req) {
        Ok(uploads) => uploads,
        Err(e) => return Response::error(StatusCode::BadRequest, &e.to_string()),
    };

    match state.jobs.submit(uploads) {
        Ok(job_id) => Response::json(StatusCode::Ok, &SubmitPayload::new(job_id)),
        Err(SubmitError::NoImages) => {
            Response::error(StatusCode::BadRequest, &SubmitError::NoImages.to_string())
        }
        Err(e) => Response::error(StatusCode::InternalServerError, &e.to_string()),
    }
}

/// Extrae los archivos de imagen del body
///
/// Un body que no es multipart equivale a "sin imágenes".
fn collect_uploads(req: &Request) -> Result<Vec<Upload>, MultipartError> {
    let content_type = req.header("content-type").unwrap_or_default();
    let boundary = match multipart::boundary_from_content_type(content_type) {
        Ok(boundary) => boundary,
        Err(MultipartError::NotMultipart) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let parts = multipart::parse(req.body(), &boundary)?;

    let mut uploads = Vec::new();
    for field in IMAGE_FIELDS {
        uploads.extend(
            parts
                .iter()
                .filter(|p| p.is_file() && p.name == *field)
                .map(|p| Upload {
                    filename: p.filename.clone(),
                    data: p.data.clone(),
                }),
        );
    }
    Ok(uploads)
}

/// Handler para `GET /status/{job_id}`
pub fn status_handler(req: &Request, state: &AppState) -> Response {
    let job_id = req.path().strip_prefix("/status/").unwrap_or_default();

    match state.jobs.get_job(job_id) {
        Some(job) => Response::json(
            StatusCode::Ok,
            &StatusPayload::from_job(&job, state.config.public_base()),
        ),
        None => Response::error(StatusCode::NotFound, "Job not found"),
    }
}

/// Handler para `GET /health`
pub fn health_handler(_req: &Request, _state: &AppState) -> Response {
    Response::json(StatusCode::Ok, &json!({ "status": "ok" }))
}
