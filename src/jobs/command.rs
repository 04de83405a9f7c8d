//! # Plantilla de SEG3D_CMD
//! src/jobs/command.rs
//!
//! Sustituye `{nombre}` por su valor. `{{` y `}}` producen llaves literales.
//! El resultado se ejecuta tal cual con `sh -c`, sin quoting adicional.

use crate::error::RunError;

/// Renderiza `template` con los valores dados
///
/// # Ejemplo
/// ```
/// use seg3d_server::jobs::command::render;
///
/// let cmd = render(
///     "seg3d --input {input_dir} --output {output_glb}",
///     &[("input_dir", "/runs/a/images"), ("output_glb", "/results/a.glb")],
/// ).unwrap();
/// assert_eq!(cmd, "seg3d --input /runs/a/images --output /results/a.glb");
/// ```
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String, RunError> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(RunError::UnbalancedBrace('{')),
                        Some(ch) => name.push(ch),
                    }
                }
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or(RunError::UnknownPlaceholder(name))?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(RunError::UnbalancedBrace('}')),
            _ => out.push(c),
        }
    }

    Ok(out)
}
