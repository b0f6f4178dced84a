use crate::errors::ToolError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FILE_NAME: &str = "snippet.py";

/// Source code staged on disk for a tool that only accepts file paths.
///
/// The file lives in its own uniquely named directory; both are removed when
/// the guard is dropped, whichever way the analysis exits.
#[derive(Debug)]
pub struct TransientSource {
    dir: TempDir,
    path: PathBuf,
}

impl TransientSource {
    pub fn create(contents: &str) -> Result<Self, ToolError> {
        let dir = tempfile::Builder::new()
            .prefix("pyreview_")
            .tempdir()
            .map_err(|e| ToolError::io("creating transient directory", &e))?;
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, contents)
            .map_err(|e| ToolError::io(format!("writing {}", path.display()), &e))?;
        tracing::trace!("staged source at {}", path.display());
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_on_drop() {
        let staged = TransientSource::create("x = 1\n").unwrap();
        let path = staged.path().to_path_buf();
        let dir = staged.dir().to_path_buf();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x = 1\n");
        drop(staged);
        assert!(!path.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_removed_when_analysis_fails() {
        fn failing_analysis() -> Result<PathBuf, ToolError> {
            let staged = TransientSource::create("y = 2\n")?;
            let path = staged.path().to_path_buf();
            Err(ToolError::failed("fake", Some(1), path.display().to_string()))
        }
        let Err(ToolError::Failed { message, .. }) = failing_analysis() else {
            panic!("expected failure");
        };
        assert!(!Path::new(&message).exists());
    }

    #[test]
    fn test_unique_per_invocation() {
        let a = TransientSource::create("").unwrap();
        let b = TransientSource::create("").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("pyreview_"));
    }
}
