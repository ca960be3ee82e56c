use serde::Deserialize;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{parse_arguments, Sandbox, SandboxError};
use crate::models::tool::Tool;

pub const NAME: &str = "run_python_file";

/// Wall-clock limit for a single script execution
pub const RUN_TIMEOUT: Duration = Duration::from_secs(30);

const PYTHON: &str = "python3";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RunPythonFileInput {
    file_path: String,
    #[serde(default)]
    args: Vec<String>,
}

pub async fn run_python_file(sandbox: &Sandbox, file_path: &str, args: &[String]) -> String {
    run_with_timeout(sandbox, file_path, args, RUN_TIMEOUT).await
}

async fn run_with_timeout(
    sandbox: &Sandbox,
    file_path: &str,
    args: &[String],
    limit: Duration,
) -> String {
    let path = match sandbox.resolve(file_path) {
        Ok(path) => path,
        Err(SandboxError::Escape) => {
            return format!(
                "Error: Cannot execute \"{}\" as it is outside the permitted working directory",
                file_path
            )
        }
        Err(SandboxError::Io(e)) => return format!("Error: {}", e),
    };

    let is_file = tokio::fs::metadata(&path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file {
        return format!("Error: File \"{}\" not found.", file_path);
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("py") {
        return format!("Error: \"{}\" is not a Python file.", file_path);
    }

    let child = Command::new(PYTHON)
        .arg(&path)
        .args(args)
        .current_dir(sandbox.root())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();
    let child = match child {
        Ok(child) => child,
        Err(e) => return format!("Error: executing Python file: {}", e),
    };

    // Dropping the pending future on timeout kills the child
    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return format!("Error: executing Python file: {}", e),
        Err(_) => {
            tracing::warn!(file = %file_path, "script timed out");
            return format!(
                "Error: executing Python file: timed out after {} seconds",
                limit.as_secs()
            );
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = output.status.code();

    if stdout.is_empty() && stderr.is_empty() && code == Some(0) {
        return "No output produced".to_string();
    }

    let mut result = format!("STDOUT: {}\nSTDERR: {}\n", stdout, stderr);
    match code {
        Some(0) => {}
        Some(code) => result.push_str(&format!("Process exited with return code {}", code)),
        None => result.push_str("Process terminated by signal"),
    }
    result
}

pub fn build_tool(sandbox: Sandbox) -> Tool {
    Tool::new(
        NAME,
        format!(
            "Executes a Python file within the working directory and returns the output from the interpreter. Runs are limited to {} seconds.",
            RUN_TIMEOUT.as_secs()
        ),
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the Python file to execute, relative to the working directory. Required."
                },
                "args": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Optional arguments to pass to the Python file."
                }
            },
            "required": ["file_path"],
            "additionalProperties": false
        }),
        move |args| {
            let sandbox = sandbox.clone();
            async move {
                let input: RunPythonFileInput = parse_arguments(NAME, args)?;
                Ok(Value::String(
                    run_python_file(&sandbox, &input.file_path, &input.args).await,
                ))
            }
        },
    )
}
