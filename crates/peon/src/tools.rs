//! Built-in tools, each confined to a sandbox root.
//!
//! Tools never fail the run for problems in the filesystem or the scripts
//! they execute: those are reported back to the model as `Error: ...` text.
//! Only arguments that cannot be bound to the tool's parameters surface as
//! [`AgentError::InvalidParameters`].
pub mod get_file_content;
pub mod get_files_info;
pub mod run_python_file;
pub mod write_file;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::ToolArguments;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("path is outside the permitted working directory")]
    Escape,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The directory every tool is confined to
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` against the sandbox root, following symlinks, and make
    /// sure the result is the root itself or one of its descendants.
    ///
    /// The target does not need to exist; missing trailing components are
    /// resolved lexically on top of the deepest existing ancestor.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, SandboxError> {
        let root = self.root.canonicalize()?;
        let joined = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            root.join(path)
        };

        let resolved = canonicalize_lenient(&joined)?;
        if !resolved.starts_with(&root) {
            return Err(SandboxError::Escape);
        }
        Ok(resolved)
    }
}

fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let mut last_err = None;
    for ancestor in path.ancestors() {
        match ancestor.canonicalize() {
            Ok(mut resolved) => {
                let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
                for component in rest.components() {
                    match component {
                        Component::Normal(part) => resolved.push(part),
                        Component::ParentDir => {
                            resolved.pop();
                        }
                        _ => {}
                    }
                }
                return Ok(resolved);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "empty path")))
}

/// Bind the named arguments of a call to a tool's parameter struct
pub(crate) fn parse_arguments<T: DeserializeOwned>(tool: &str, args: ToolArguments) -> AgentResult<T> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| AgentError::InvalidParameters(format!("{}: {}", tool, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_relative_and_nested() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("pkg"))?;
        fs::write(dir.path().join("pkg/calculator.py"), "")?;
        let sandbox = Sandbox::new(dir.path());
        let root = dir.path().canonicalize()?;

        assert_eq!(sandbox.resolve(".")?, root);
        assert_eq!(sandbox.resolve("pkg/calculator.py")?, root.join("pkg/calculator.py"));
        assert_eq!(sandbox.resolve("pkg/../pkg/new.py")?, root.join("pkg/new.py"));
        assert_eq!(sandbox.resolve("missing/deeper/file.txt")?, root.join("missing/deeper/file.txt"));
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_escapes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let sandbox = Sandbox::new(dir.path());

        assert!(matches!(sandbox.resolve("../"), Err(SandboxError::Escape)));
        assert!(matches!(sandbox.resolve("/bin"), Err(SandboxError::Escape)));
        assert!(matches!(sandbox.resolve("missing/../../outside.txt"), Err(SandboxError::Escape)));
        Ok(())
    }

    #[test]
    fn test_resolve_absolute_inside_root() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().canonicalize()?;
        let sandbox = Sandbox::new(dir.path());
        let inside = root.join("lorem.txt");
        assert_eq!(sandbox.resolve(inside.to_str().unwrap())?, inside);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let outside = tempfile::tempdir()?;
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link"))?;
        let sandbox = Sandbox::new(dir.path());
        assert!(matches!(sandbox.resolve("link/secret.txt"), Err(SandboxError::Escape)));
        Ok(())
    }

    #[test]
    fn test_missing_root_is_an_io_error() {
        let sandbox = Sandbox::new("/definitely/not/a/real/sandbox/root");
        assert!(matches!(sandbox.resolve("."), Err(SandboxError::Io(_))));
    }
}
