//! Output Writer - Touch Generated Files Only When They Change
//!
//! Unchanged files keep their modification time so build systems do not
//! recompile everything that includes them.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::render::RenderedFile;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Output path {0} is a directory")]
    IsDirectory(PathBuf),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome, OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.is_dir() {
        return Err(OutputError::IsDirectory(path.to_path_buf()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            info!(dir = %parent.display(), "creating output directory");
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let outcome = if path.exists() {
        let existing = fs::read(path).map_err(io_err)?;
        if existing == contents.as_bytes() {
            debug!(path = %path.display(), "existing file is up-to-date");
            return Ok(WriteOutcome::Unchanged);
        }
        warn!(path = %path.display(), "output already exists, replacing it");
        WriteOutcome::Updated
    } else {
        WriteOutcome::Created
    };

    fs::write(path, contents).map_err(io_err)?;
    Ok(outcome)
}

/// Write every rendered file into `dir`
pub fn write_all(
    dir: &Path,
    files: &[RenderedFile],
) -> Result<Vec<(PathBuf, WriteOutcome)>, OutputError> {
    files
        .iter()
        .map(|file| {
            let path = dir.join(&file.file_name);
            write_if_changed(&path, &file.contents).map(|outcome| (path, outcome))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen").join("R.h");

        assert_eq!(write_if_changed(&path, "a").unwrap(), WriteOutcome::Created);
        assert_eq!(write_if_changed(&path, "a").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, "b").unwrap(), WriteOutcome::Updated);
        assert_eq!(fs::read_to_string(&path).unwrap(), "b");
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            write_if_changed(dir.path(), "a"),
            Err(OutputError::IsDirectory(_))
        ));
    }

    #[test]
    fn test_write_all() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            RenderedFile { file_name: "R.h".into(), contents: "h".into() },
            RenderedFile { file_name: "R.m".into(), contents: "m".into() },
        ];
        let written = write_all(dir.path(), &files).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|(_, o)| *o == WriteOutcome::Created));
        assert_eq!(fs::read_to_string(dir.path().join("R.m")).unwrap(), "m");
    }
}
