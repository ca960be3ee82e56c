use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use tokio::io::AsyncReadExt;

use super::{parse_arguments, Sandbox, SandboxError};
use crate::models::tool::Tool;

pub const NAME: &str = "get_file_content";

/// Maximum number of characters returned from a file
pub const MAX_CHARS: usize = 10_000;

// Enough bytes for MAX_CHARS + 1 characters of any UTF-8 width
const READ_LIMIT: u64 = MAX_CHARS as u64 * 4 + 4;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GetFileContentInput {
    file_path: String,
}

/// Read a text file inside the sandbox, truncated to [`MAX_CHARS`] characters
pub async fn get_file_content(sandbox: &Sandbox, file_path: &str) -> String {
    let path = match sandbox.resolve(file_path) {
        Ok(path) => path,
        Err(SandboxError::Escape) => {
            return format!(
                "Error: Cannot read \"{}\" as it is outside the permitted working directory",
                file_path
            )
        }
        Err(SandboxError::Io(e)) => return format!("Error: {}", e),
    };

    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        _ => {
            return format!(
                "Error: File not found or is not a regular file: \"{}\"",
                file_path
            )
        }
    }

    let bytes = match read_prefix(&path).await {
        Ok(bytes) => bytes,
        Err(e) => return format!("Error: Cannot read \"{}\": {}", file_path, e),
    };

    // Bytes past the returned characters are never decoded
    let (text, decode_error) = match std::str::from_utf8(&bytes) {
        Ok(text) => (text, None),
        Err(e) => (
            std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
            Some(e),
        ),
    };

    match (text.char_indices().nth(MAX_CHARS), decode_error) {
        (Some((end, _)), _) => format!(
            "{}[...File \"{}\" truncated at {} characters]",
            &text[..end],
            file_path,
            MAX_CHARS
        ),
        (None, Some(e)) => format!("Error: Cannot read \"{}\": {}", file_path, e),
        (None, None) => text.to_string(),
    }
}

async fn read_prefix(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut bytes = Vec::new();
    file.take(READ_LIMIT).read_to_end(&mut bytes).await?;
    Ok(bytes)
}

pub fn build_tool(sandbox: Sandbox) -> Tool {
    Tool::new(
        NAME,
        format!(
            "Reads the content from the file located at the given file_path, constrained to the working directory, as a string truncated to {} characters.",
            MAX_CHARS
        ),
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path to the file to read from, relative to the working directory. Required."
                }
            },
            "required": ["file_path"],
            "additionalProperties": false
        }),
        move |args| {
            let sandbox = sandbox.clone();
            async move {
                let input: GetFileContentInput = parse_arguments(NAME, args)?;
                Ok(Value::String(get_file_content(&sandbox, &input.file_path).await))
            }
        },
    )
}
