use crate::backend::{check_key, KeyValueBackend};
use crate::error::Result;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// File-based implementation of [`KeyValueBackend`].
///
/// Each key lives in `<dir>/<key>.json`. Writes go to a temporary sibling
/// first and are renamed into place, so a reader never sees a torn document.
/// A write that fails part way leaves no temporary file behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens a backend rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "file storage ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        let path = self.path_for(key);

        let mut tmp = NamedTempFile::with_prefix_in(format!(".{key}."), &self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), bytes = value.len(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.write("shortenedUrls", "[1,2,3]").unwrap();

        assert_eq!(
            backend.read("shortenedUrls").unwrap().as_deref(),
            Some("[1,2,3]")
        );
        assert!(dir.path().join("shortenedUrls.json").exists());
        assert_eq!(entries(dir.path()), ["shortenedUrls.json"]);
    }

    #[test]
    fn failed_write_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        // A non-empty directory where the document should go makes the
        // final rename fail.
        let blocked = dir.path().join("k.json");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        assert!(matches!(backend.write("k", "{}"), Err(StorageError::Io(_))));
        assert_eq!(entries(dir.path()), ["k.json"]);
    }

    #[test]
    fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        assert!(backend.read("shortcodeClicks").unwrap().is_none());
    }

    #[test]
    fn creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let backend = FileBackend::open(&nested).unwrap();
        backend.write("k", "{}").unwrap();

        assert_eq!(backend.dir(), nested.as_path());
        assert!(nested.join("k.json").exists());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileBackend::open(dir.path())
            .unwrap()
            .write("k", "\"v\"")
            .unwrap();

        let reopened = FileBackend::open(dir.path()).unwrap();
        assert_eq!(reopened.read("k").unwrap().as_deref(), Some("\"v\""));
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        assert!(matches!(
            backend.write("../outside", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
