//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 (acepta también HTTP/1.1) con body binario.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /run HTTP/1.0\r\n
//! Content-Type: multipart/form-data; boundary=XYZ\r\n
//! Content-Length: 1234\r\n
//! \r\n
//! <body binario>
//! ```
//!
//! El body se lee completo según `Content-Length`; las imágenes subidas
//! son binarias, así que nunca se interpreta como UTF-8.

use std::collections::HashMap;
use std::io::Read;
use thiserror::Error;

/// Tamaño máximo de la cabecera (request line + headers)
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// POST - Enviar datos a un recurso
    POST,

    /// OPTIONS - Preflight de CORS
    OPTIONS,
}

impl Method {
    fn parse(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "OPTIONS" => Ok(Method::OPTIONS),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

/// Representa un request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path decodificado, sin query string (ej: "/status/abc123")
    path: String,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    version: String,

    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    #[error("Empty request")]
    EmptyRequest,
}

/// Errores al leer un request desde el socket
#[derive(Error, Debug)]
pub enum ReadError {
    /// El cliente cerró la conexión sin enviar nada
    #[error("connection closed")]
    Closed,

    #[error("Request headers exceed {} bytes", MAX_HEAD_BYTES)]
    HeadersTooLarge,

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Truncated request body")]
    Truncated,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Request {
    /// Parsea un request completo (cabecera + body) desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use seg3d_server::http::Request;
    ///
    /// let raw = b"GET /status/abc HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/status/abc");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let (head, body) = match find_head_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + 4..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequestLine)?;
        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            headers,
            version,
            body: body.to_vec(),
        })
    }

    /// Lee un request desde un stream
    ///
    /// Lee hasta el fin de la cabecera, valida `Content-Length` contra
    /// `max_body` y después lee exactamente el body anunciado.
    pub fn read_from<R: Read>(reader: &mut R, max_body: usize) -> Result<Self, ReadError> {
        let mut buffer = Vec::with_capacity(8192);
        let mut chunk = [0u8; 8192];

        let head_end = loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                if buffer.is_empty() {
                    return Err(ReadError::Closed);
                }
                // Cabecera sin terminar: se parsea lo que haya
                break None;
            }
            buffer.extend_from_slice(&chunk[..n]);

            if let Some(end) = find_head_end(&buffer) {
                break Some(end);
            }
            if buffer.len() > MAX_HEAD_BYTES {
                return Err(ReadError::HeadersTooLarge);
            }
        };

        let Some(head_end) = head_end else {
            return Ok(Self::parse(&buffer)?);
        };

        let mut request = Self::parse(&buffer[..head_end + 4])?;
        let content_length = request.content_length()?.unwrap_or(0);
        if content_length > max_body {
            return Err(ReadError::BodyTooLarge { limit: max_body });
        }

        let mut body = buffer.split_off(head_end + 4);
        body.truncate(content_length);
        if body.len() < content_length {
            let already = body.len();
            body.resize(content_length, 0);
            reader
                .read_exact(&mut body[already..])
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::UnexpectedEof => ReadError::Truncated,
                    _ => ReadError::Io(e),
                })?;
        }
        request.body = body;

        Ok(request)
    }

    /// Parsea la request line
    ///
    /// Formato: `GET /path?query HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD PATH VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::parse(parts[0])?;

        let raw_path = parts[1].split('?').next().unwrap_or_default();
        if !raw_path.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }
        let path = urlencoding::decode(raw_path)
            .map_err(|_| ParseError::InvalidRequestLine)?
            .into_owned();

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, version))
    }

    /// Parsea los headers HTTP (`Name: Value`)
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    /// Valor de `Content-Length`, si viene
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        self.header("content-length")
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|_| ParseError::InvalidContentLength(v.to_string()))
            })
            .transpose()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Posición del `\r\n\r\n` que cierra la cabecera
fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_simple_get() {
        let request = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), "HTTP/1.0");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_parse_strips_query_and_decodes() {
        let request = Request::parse(b"GET /results/my%20mesh.glb?x=1 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/results/my mesh.glb");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let raw = b"GET / HTTP/1.0\r\nHost: localhost:8000\r\nContent-Type: text/plain\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("host"), Some("localhost:8000"));
        assert_eq!(request.header("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn test_binary_body() {
        let mut raw = b"POST /run HTTP/1.0\r\nContent-Length: 4\r\n\r\n".to_vec();
        raw.extend_from_slice(&[0x00, 0xFF, 0x0D, 0x0A]);
        let request = Request::parse(&raw).unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.body(), &[0x00, 0xFF, 0x0D, 0x0A]);
    }

    #[test]
    fn test_options_method() {
        let request = Request::parse(b"OPTIONS /run HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.method(), Method::OPTIONS);
    }

    #[test]
    fn test_unsupported_method() {
        let result = Request::parse(b"DELETE / HTTP/1.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnsupportedMethod(_))));
    }

    #[test]
    fn test_invalid_version() {
        let result = Request::parse(b"GET / HTTP/2.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(Request::parse(b""), Err(ParseError::EmptyRequest)));
    }

    #[test]
    fn test_invalid_request_line() {
        let result = Request::parse(b"GET\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
    }

    #[test]
    fn test_invalid_header() {
        let result = Request::parse(b"GET / HTTP/1.0\r\nnocolon\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }

    #[test]
    fn test_read_from_reads_full_body() {
        let mut raw = b"POST /run HTTP/1.0\r\nContent-Length: 10\r\n\r\n".to_vec();
        raw.extend_from_slice(b"0123456789");
        let mut cursor = Cursor::new(raw);

        let request = Request::read_from(&mut cursor, 1024).unwrap();
        assert_eq!(request.body(), b"0123456789");
    }

    #[test]
    fn test_read_from_body_larger_than_chunk() {
        let body = vec![7u8; 50_000];
        let mut raw = format!("POST /run HTTP/1.0\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        raw.extend_from_slice(&body);

        let request = Request::read_from(&mut Cursor::new(raw), 100_000).unwrap();
        assert_eq!(request.body().len(), 50_000);
    }

    #[test]
    fn test_read_from_too_large() {
        let raw = b"POST /run HTTP/1.0\r\nContent-Length: 2048\r\n\r\n".to_vec();
        let result = Request::read_from(&mut Cursor::new(raw), 1024);
        assert!(matches!(result, Err(ReadError::BodyTooLarge { limit: 1024 })));
    }

    #[test]
    fn test_read_from_truncated_body() {
        let raw = b"POST /run HTTP/1.0\r\nContent-Length: 20\r\n\r\nshort".to_vec();
        let result = Request::read_from(&mut Cursor::new(raw), 1024);
        assert!(matches!(result, Err(ReadError::Truncated)));
    }

    #[test]
    fn test_read_from_closed() {
        let result = Request::read_from(&mut Cursor::new(Vec::new()), 1024);
        assert!(matches!(result, Err(ReadError::Closed)));
    }

    #[test]
    fn test_read_from_bad_content_length() {
        let raw = b"POST /run HTTP/1.0\r\nContent-Length: abc\r\n\r\n".to_vec();
        let result = Request::read_from(&mut Cursor::new(raw), 1024);
        assert!(matches!(
            result,
            Err(ReadError::Parse(ParseError::InvalidContentLength(_)))
        ));
    }
}
