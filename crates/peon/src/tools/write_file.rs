use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_arguments, Sandbox, SandboxError};
use crate::models::tool::Tool;

pub const NAME: &str = "write_file";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteFileInput {
    file_path: String,
    content: String,
}

/// Create or overwrite a file inside the sandbox, creating parent directories as needed
pub async fn write_file(sandbox: &Sandbox, file_path: &str, content: &str) -> String {
    let path = match sandbox.resolve(file_path) {
        Ok(path) => path,
        Err(SandboxError::Escape) => {
            return format!(
                "Error: Cannot write to \"{}\" as it is outside the permitted working directory",
                file_path
            )
        }
        Err(SandboxError::Io(e)) => return format!("Error: {}", e),
    };

    let is_dir = tokio::fs::metadata(&path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    if is_dir {
        return format!("Error: \"{}\" is a directory", file_path);
    }

    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            return format!("Error: Cannot create \"{}\"; error: {}", file_path, e);
        }
    }

    match tokio::fs::write(&path, content).await {
        Ok(()) => format!(
            "Successfully wrote to \"{}\" ({} bytes written)",
            file_path,
            content.len()
        ),
        Err(e) => format!("Error: Cannot write to \"{}\"; error: {}", file_path, e),
    }
}

pub fn build_tool(sandbox: Sandbox) -> Tool {
    Tool::new(
        NAME,
        "Writes content to a file at the specified file_path, constrained to the working directory. Creates the file and any missing directories, and overwrites existing content.",
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path of the file to write to, relative to the working directory. Required."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file. Required."
                }
            },
            "required": ["file_path", "content"],
            "additionalProperties": false
        }),
        move |args| {
            let sandbox = sandbox.clone();
            async move {
                let input: WriteFileInput = parse_arguments(NAME, args)?;
                Ok(Value::String(
                    write_file(&sandbox, &input.file_path, &input.content).await,
                ))
            }
        },
    )
}
