//! # Ejecución de SEG3D_CMD
//! src/jobs/runner.rs
//!
//! Renderiza la plantilla, la ejecuta con `sh -c` y verifica que el `.glb`
//! exista. Cualquier fallo se devuelve como `RunError` y el manager lo
//! registra como mensaje del job.

use crate::error::RunError;
use crate::jobs::command;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Intervalo de sondeo del proceso cuando hay timeout
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Texto cuando el comando falla sin escribir nada
pub const GENERIC_FAILURE: &str = "Seg3D command failed";

/// Ejecutor del comando externo
#[derive(Debug, Clone)]
pub struct Seg3dRunner {
    template: Option<String>,
    timeout: Option<Duration>,
}

impl Seg3dRunner {
    /// `timeout_secs == 0` desactiva el timeout
    pub fn new(template: Option<String>, timeout_secs: u64) -> Self {
        Self {
            template,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    /// Comando final para un job, o error si no hay plantilla
    pub fn command_for(&self, input_dir: &Path, output_glb: &Path) -> Result<String, RunError> {
        let template = self
            .template
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(RunError::MissingCommand)?;

        let input_dir = input_dir.to_string_lossy();
        let output_glb = output_glb.to_string_lossy();
        command::render(
            template,
            &[("input_dir", input_dir.as_ref()), ("output_glb", output_glb.as_ref())],
        )
    }

    /// Ejecuta el comando capturando stdout/stderr
    pub fn run(&self, input_dir: &Path, output_glb: &Path) -> Result<(), RunError> {
        let cmd = self.command_for(input_dir, output_glb)?;
        tracing::debug!(command = %cmd, "spawning SEG3D_CMD");

        let output = self.execute(&cmd)?;
        if !output.status.success() {
            tracing::debug!(exit_code = ?output.status.code(), "SEG3D_CMD exited with failure");
            return Err(RunError::CommandFailed(failure_text(&output)));
        }

        if !output_glb.exists() {
            return Err(RunError::MissingOutput);
        }

        Ok(())
    }

    /// Ejecuta el comando heredando stdio (binario `seg3d-run`)
    pub fn run_inherited(&self, input_dir: &Path, output_glb: &Path) -> Result<(), RunError> {
        let cmd = self.command_for(input_dir, output_glb)?;
        let mut child = self.shell(&cmd).spawn()?;

        let status = self.wait(&mut child)?;
        if !status.success() {
            return Err(RunError::CommandFailed(GENERIC_FAILURE.to_string()));
        }
        Ok(())
    }

    /// `sh -c cmd`; con timeout el shell abre su propio grupo de procesos
    fn shell(&self, cmd: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        if self.timeout.is_some() {
            command.process_group(0);
        }
        command
    }

    fn execute(&self, cmd: &str) -> Result<Output, RunError> {
        let mut child = self
            .shell(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Los pipes se vacían en paralelo para que el hijo no se bloquee
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // Si hay timeout los lectores quedan sueltos
        let status = self.wait(&mut child)?;

        Ok(Output {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }

    /// Espera al hijo; al vencer el timeout mata todo su grupo
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, RunError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= timeout {
                kill_group(child);
                return Err(RunError::Timeout(timeout.as_secs()));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// SIGKILL al grupo del shell (el shell y todo lo que haya lanzado)
fn kill_group(child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(errno) = killpg(pgid, Signal::SIGKILL) {
        tracing::warn!(pid = child.id(), %errno, "failed to kill process group");
        let _ = child.kill();
    }
    let _ = child.wait();
}

/// Lee un pipe completo en un thread aparte
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// stderr, si no stdout, si no el texto genérico
fn failure_text(output: &Output) -> String {
    [&output.stderr, &output.stdout]
        .into_iter()
        .find(|bytes| !bytes.is_empty())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dirs() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("images");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("a.jpg"), b"jpeg").unwrap();
        let output = tmp.path().join("out.glb");
        (tmp, input, output)
    }

    #[test]
    fn test_missing_command() {
        let (_tmp, input, output) = dirs();
        let err = Seg3dRunner::new(None, 0).run(&input, &output).unwrap_err();
        assert!(matches!(err, RunError::MissingCommand));

        let err = Seg3dRunner::new(Some("   ".to_string()), 0)
            .run(&input, &output)
            .unwrap_err();
        assert!(matches!(err, RunError::MissingCommand));
    }

    #[test]
    fn test_success_creates_output() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("cp {input_dir}/a.jpg {output_glb}".to_string()), 0);

        runner.run(&input, &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"jpeg");
    }

    #[test]
    fn test_failure_prefers_stderr() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("echo out; echo bad >&2; exit 2".to_string()), 0);

        let err = runner.run(&input, &output).unwrap_err();
        assert_eq!(err.to_string(), "bad\n");
    }

    #[test]
    fn test_failure_falls_back_to_stdout() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("echo only-stdout; exit 1".to_string()), 0);

        let err = runner.run(&input, &output).unwrap_err();
        assert_eq!(err.to_string(), "only-stdout\n");
    }

    #[test]
    fn test_silent_failure_generic_message() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("exit 7".to_string()), 0);

        let err = runner.run(&input, &output).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn test_success_without_output_file() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("true".to_string()), 0);

        let err = runner.run(&input, &output).unwrap_err();
        assert_eq!(err.to_string(), "Output .glb was not created");
    }

    #[test]
    fn test_template_error_is_reported() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("run {weights}".to_string()), 0);

        let err = runner.run(&input, &output).unwrap_err();
        assert_eq!(err.to_string(), "unknown placeholder 'weights' in SEG3D_CMD");
    }

    #[test]
    fn test_timeout_kills_command() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("sleep 5".to_string()), 1);

        let start = Instant::now();
        let err = runner.run(&input, &output).unwrap_err();

        assert!(matches!(err, RunError::Timeout(1)));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_kills_nested_programs() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(
            Some("sh -c 'sleep 2; touch {output_glb}'; true".to_string()),
            1,
        );

        let err = runner.run(&input, &output).unwrap_err();
        assert!(matches!(err, RunError::Timeout(1)));

        thread::sleep(Duration::from_secs(3));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_inherited_timeout() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("sleep 5".to_string()), 1);

        let start = Instant::now();
        let err = runner.run_inherited(&input, &output).unwrap_err();

        assert!(matches!(err, RunError::Timeout(1)));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_with_timeout_that_is_not_reached() {
        let (_tmp, input, output) = dirs();
        let runner = Seg3dRunner::new(Some("cp {input_dir}/a.jpg {output_glb}".to_string()), 5);

        runner.run(&input, &output).unwrap();
        runner.run_inherited(&input, &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"jpeg");
    }

    #[test]
    fn test_run_inherited() {
        let (_tmp, input, output) = dirs();
        let ok = Seg3dRunner::new(Some("cp {input_dir}/a.jpg {output_glb}".to_string()), 0);
        ok.run_inherited(&input, &output).unwrap();
        assert!(output.exists());

        let bad = Seg3dRunner::new(Some("exit 1".to_string()), 0);
        let err = bad.run_inherited(&input, &output).unwrap_err();
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }
}
