//! # Seg3D Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 concurrente implementado desde cero que recibe fotos
//! por `multipart/form-data`, lanza un comando externo de reconstrucción
//! (`SEG3D_CMD`) por cada job y sirve la malla `.glb` resultante.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing del protocolo HTTP/1.0 y de uploads multipart
//! - `server`: Lógica del servidor TCP, CORS y estado compartido
//! - `router`: Enrutamiento de peticiones a handlers
//! - `jobs`: Registro de jobs, ejecución de `SEG3D_CMD` y endpoints
//! - `results`: Archivos estáticos bajo `/results`
//! - `config`: Configuración por CLI y variables de entorno
//! - `error`: Errores tipados
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use seg3d_server::config::Config;
//! use seg3d_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::new(config).expect("Error al iniciar servidor");
//! server.run().expect("Error al aceptar conexiones");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod results;
pub mod router;
pub mod server;
