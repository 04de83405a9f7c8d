//! # Módulo HTTP
//!
//! Implementa el protocolo HTTP/1.0 desde cero, sin librerías de alto nivel:
//!
//! - Parsing de requests (con body binario)
//! - Construcción de responses
//! - Códigos de estado
//! - Parsing de `multipart/form-data` para los uploads
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 15\r\n
//! \r\n
//! {"status":"ok"}
//! ```

pub mod multipart;
pub mod request;
pub mod response;
pub mod status;

// Permite usar `http::Request` en vez de `http::request::Request`
pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;
