//! # Servidor de Resultados
//! src/results/mod.rs
//!
//! `GET /results/{file}` sirve archivos de `results_dir`. Solo nombres
//! planos: cualquier intento de salir del directorio responde 404.
//! Cada respuesta lleva un `ETag` (SHA-256 del contenido) y `If-None-Match`
//! con el mismo valor da 304.

use crate::http::{Request, Response, StatusCode};
use crate::server::AppState;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Handler para `GET|HEAD /results/{file}`
pub fn results_handler(req: &Request, state: &AppState) -> Response {
    let name = req.path().strip_prefix("/results/").unwrap_or_default();
    if !is_plain_filename(name) {
        return Response::error(StatusCode::NotFound, "Not Found");
    }

    let path = state.config.results_dir.join(name);
    if !path.is_file() {
        return Response::error(StatusCode::NotFound, "Not Found");
    }

    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read result file");
            return Response::error(StatusCode::InternalServerError, "Failed to read file");
        }
    };

    let etag = etag_for(&data);
    if req
        .header("if-none-match")
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"))
    {
        return Response::new(StatusCode::NotModified).with_header("ETag", &etag);
    }

    Response::new(StatusCode::Ok)
        .with_header("Content-Type", content_type_for(&path))
        .with_header("ETag", &etag)
        .with_body_bytes(data)
}

/// Un único componente, sin separadores ni `.`/`..`
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// ETag entre comillas con el SHA-256 del contenido
pub fn etag_for(data: &[u8]) -> String {
    format!("\"{:x}\"", Sha256::digest(data))
}

/// Content-Type según la extensión
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "glb" => "model/gltf-binary",
        "gltf" => "model/gltf+json",
        "obj" => "model/obj",
        "ply" => "application/ply",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" | "log" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
