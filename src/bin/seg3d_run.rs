//! # seg3d-run
//! src/bin/seg3d_run.rs
//!
//! Ejecuta `SEG3D_CMD` una vez desde la terminal, igual que lo haría un job
//! del servidor pero heredando stdout/stderr.
//!
//! ```bash
//! SEG3D_CMD="python run.py --input {input_dir} --output {output_glb}" \
//!   seg3d-run --input ./runs/abc/images --output ./results/abc.glb
//! ```

use clap::Parser;
use seg3d_server::jobs::runner::Seg3dRunner;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "seg3d-run")]
#[command(about = "Ejecuta SEG3D_CMD sobre un directorio de imágenes")]
#[command(version)]
struct Args {
    /// Directorio con las imágenes de entrada
    #[arg(long)]
    input: PathBuf,

    /// Ruta del .glb de salida
    #[arg(long)]
    output: PathBuf,

    /// Plantilla del comando ({input_dir}, {output_glb})
    #[arg(long = "seg3d-cmd", env = "SEG3D_CMD")]
    seg3d_cmd: Option<String>,

    /// Timeout en segundos (0 = sin límite)
    #[arg(long = "timeout-secs", default_value = "0", env = "JOB_TIMEOUT_SECS")]
    timeout_secs: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!(dir = %parent.display(), error = %e, "failed to create output directory");
            std::process::exit(1);
        }
    }

    let runner = Seg3dRunner::new(args.seg3d_cmd, args.timeout_secs);
    match runner.run_inherited(&args.input, &args.output) {
        Ok(()) => tracing::info!(output = %args.output.display(), "done"),
        Err(e) => {
            tracing::error!(error = %e, "seg3d-run failed");
            std::process::exit(1);
        }
    }
}
