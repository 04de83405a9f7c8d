//! # Errores del Servidor
//! src/error.rs
//!
//! Errores tipados del servidor. Los errores del protocolo HTTP viven en
//! `http::request` y `http::multipart`; aquí están los de arranque y los de
//! ejecución de jobs.

use thiserror::Error;

/// Mensaje que se registra cuando falta `SEG3D_CMD`
pub const MISSING_COMMAND_MESSAGE: &str = "SEG3D_CMD is not set. Example: \
SEG3D_CMD=\"python /path/to/run_seg3d.py --input {input_dir} --output {output_glb}\"";

/// Errores al ejecutar el comando externo de un job.
///
/// El `Display` de cada variante es exactamente el mensaje que ve el cliente
/// en `/status/{job_id}` cuando el job termina en `failed`.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("{}", MISSING_COMMAND_MESSAGE)]
    MissingCommand,

    #[error("unknown placeholder '{0}' in SEG3D_CMD")]
    UnknownPlaceholder(String),

    #[error("unbalanced '{0}' in SEG3D_CMD")]
    UnbalancedBrace(char),

    #[error("{0}")]
    Spawn(#[from] std::io::Error),

    /// Salida no-cero: lleva stderr, stdout o un texto genérico
    #[error("{0}")]
    CommandFailed(String),

    #[error("Output .glb was not created")]
    MissingOutput,

    #[error("Seg3D command timed out after {0} s")]
    Timeout(u64),
}

/// Errores al aceptar un upload en `POST /run`
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("No images uploaded")]
    NoImages,

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Errores de arranque y de I/O del servidor
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
