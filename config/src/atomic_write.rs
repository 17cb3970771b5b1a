//! Atomic file write helper.
//!
//! Uses a temp file in the destination directory + rename, so readers never
//! observe a half-written file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    // Keep the permissions of the file being replaced (e.g. executable scripts).
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())?;
    }

    tmp.persist(path).map_err(|err| err.error)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote file atomically");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::atomic_write;

    #[test]
    fn atomic_write_creates_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.py");

        atomic_write(&path, b"one").expect("write one");
        atomic_write(&path, b"two").expect("write two");

        let content = fs::read_to_string(&path).expect("read");
        assert_eq!(content, "two");
        let leftovers = fs::read_dir(dir.path()).expect("read_dir").count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_preserves_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("script.py");
        fs::write(&path, "#!/usr/bin/env python\n").expect("seed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");

        atomic_write(&path, b"#!/usr/bin/env python3\n").expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }
}
