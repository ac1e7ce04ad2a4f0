// projeto: mhexperiment
// file: src/mh/exec.rs
// Runs one snippet as a child process and captures its outcome

use log::info;
use std::path::Path;
use std::process::Command;

use crate::MhError;

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub ok: bool,
    pub exit_code: Option<i32>,
    pub console: String,
}

pub fn exec_snippet(interpreter: &str, snippet_file: &Path, exec_dir: &Path) -> Result<ExecResult, MhError> {
    let mut parts = interpreter.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| MhError::Config("Empty interpreter command".to_string()))?;

    info!(
        "🚀 Executing snippet {} with '{}' in {}",
        snippet_file.display(),
        interpreter,
        exec_dir.display()
    );

    let output = Command::new(program)
        .args(parts)
        .arg(snippet_file)
        .current_dir(exec_dir)
        .output()
        .map_err(|e| MhError::Exec(format!("Error exec process {}: {}", interpreter, e)))?;

    let mut console = String::from_utf8_lossy(&output.stdout).into_owned();
    console.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(ExecResult {
        ok: output.status.success(),
        exit_code: output.status.code(),
        console,
    })
}
