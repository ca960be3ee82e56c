use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;

use super::{parse_arguments, Sandbox, SandboxError};
use crate::models::tool::Tool;

pub const NAME: &str = "get_files_info";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GetFilesInfoInput {
    #[serde(default = "default_directory")]
    directory: String,
}

fn default_directory() -> String {
    ".".to_string()
}

/// List a directory inside the sandbox, one line per entry sorted by name
pub async fn get_files_info(sandbox: &Sandbox, directory: &str) -> String {
    let path = match sandbox.resolve(directory) {
        Ok(path) => path,
        Err(SandboxError::Escape) => {
            return format!(
                "Error: Cannot list \"{}\" as it is outside the permitted working directory",
                directory
            )
        }
        Err(SandboxError::Io(e)) => return format!("Error: {}", e),
    };

    let is_dir = tokio::fs::metadata(&path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return format!("Error: \"{}\" is not a directory", directory);
    }

    match list_entries(&path).await {
        Ok(entries) => entries
            .iter()
            .fold(String::new(), |mut acc, (name, size, is_dir)| {
                let _ = writeln!(acc, "- {}: file_size={} bytes, is_dir={}", name, size, is_dir);
                acc
            }),
        Err(e) => format!("Error reading directory contents: {}", e),
    }
}

async fn list_entries(path: &std::path::Path) -> std::io::Result<Vec<(String, u64, bool)>> {
    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let metadata = tokio::fs::metadata(entry.path()).await?;
        entries.push((
            entry.file_name().to_string_lossy().into_owned(),
            metadata.len(),
            metadata.is_dir(),
        ));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

pub fn build_tool(sandbox: Sandbox) -> Tool {
    Tool::new(
        NAME,
        "Lists files in the specified directory along with their sizes, constrained to the working directory.",
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                }
            },
            "required": [],
            "additionalProperties": false
        }),
        move |args| {
            let sandbox = sandbox.clone();
            async move {
                let input: GetFilesInfoInput = parse_arguments(NAME, args)?;
                Ok(Value::String(get_files_info(&sandbox, &input.directory).await))
            }
        },
    )
}
