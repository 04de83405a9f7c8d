//! # Parsing de multipart/form-data
//! src/http/multipart.rs
//!
//! Separa un body `multipart/form-data` (RFC 7578) en sus partes.
//!
//! ```text
//! --BOUNDARY\r\n
//! Content-Disposition: form-data; name="images[]"; filename="a.jpg"\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <bytes>\r\n
//! --BOUNDARY--\r\n
//! ```

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Una parte del formulario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Nombre del campo (`name=`)
    pub name: String,

    /// Nombre de archivo enviado por el cliente, si es un archivo
    pub filename: Option<String>,

    pub content_type: Option<String>,

    pub data: Vec<u8>,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    #[error("Content-Type is not multipart/form-data")]
    NotMultipart,

    #[error("Missing multipart boundary")]
    MissingBoundary,

    #[error("Malformed multipart body: {0}")]
    Malformed(&'static str),
}

/// Extrae el boundary de un header `Content-Type`
///
/// # Ejemplo
/// ```
/// use seg3d_server::http::multipart::boundary_from_content_type;
///
/// let ct = "multipart/form-data; boundary=----abc";
/// assert_eq!(boundary_from_content_type(ct).unwrap(), "----abc");
/// ```
pub fn boundary_from_content_type(content_type: &str) -> Result<String, MultipartError> {
    let mut pieces = content_type.split(';');
    let mime = pieces.next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return Err(MultipartError::NotMultipart);
    }

    pieces
        .filter_map(|p| p.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
        .ok_or(MultipartError::MissingBoundary)
}

/// Parsea el body completo en partes
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>, MultipartError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();

    let mut pos = find(body, &delimiter, 0).ok_or(MultipartError::Malformed("no opening boundary"))?;

    loop {
        pos += delimiter.len();
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            // Boundary de cierre
            return Ok(parts);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(MultipartError::Malformed("boundary not followed by CRLF"));
        }
        pos += 2;

        let head_end = find(body, b"\r\n\r\n", pos).ok_or(MultipartError::Malformed("part without headers end"))?;
        let head = std::str::from_utf8(&body[pos..head_end])
            .map_err(|_| MultipartError::Malformed("part headers are not UTF-8"))?;
        let headers = parse_part_headers(head);

        let data_start = head_end + 4;
        let mut closing = b"\r\n".to_vec();
        closing.extend_from_slice(&delimiter);
        let data_end = find(body, &closing, data_start).ok_or(MultipartError::Malformed("missing closing boundary"))?;

        let disposition = headers
            .get("content-disposition")
            .ok_or(MultipartError::Malformed("part without Content-Disposition"))?;
        let params = disposition_params(disposition);
        let name = params
            .get("name")
            .cloned()
            .ok_or(MultipartError::Malformed("part without name"))?;

        parts.push(Part {
            name,
            filename: params.get("filename").cloned(),
            content_type: headers.get("content-type").cloned(),
            data: body[data_start..data_end].to_vec(),
        });

        // Apunta al inicio del siguiente delimitador
        pos = data_end + 2;
    }
}

fn parse_part_headers(head: &str) -> HashMap<String, String> {
    head.split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect()
}

/// Parámetros `key="value"` o `key=value` de un Content-Disposition
fn disposition_params(disposition: &str) -> HashMap<String, String> {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    let re = PARAM.get_or_init(|| {
        Regex::new(r#";\s*([A-Za-z0-9_*-]+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([^;]*))"#)
            .expect("Content-Disposition regex is valid")
    });

    re.captures_iter(disposition)
        .map(|caps| {
            let key = caps[1].to_ascii_lowercase();
            let value = match (caps.get(2), caps.get(3)) {
                (Some(quoted), _) => quoted.as_str().replace("\\\"", "\"").replace("\\\\", "\\"),
                (None, Some(bare)) => bare.as_str().trim().to_string(),
                (None, None) => String::new(),
            };
            (key, value)
        })
        .collect()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}
