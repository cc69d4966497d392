use crate::error::{Result, VolfetchError};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

fn map_io(path: &Path, e: std::io::Error) -> VolfetchError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => VolfetchError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => VolfetchError::from(e),
    }
}

pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| map_io(path, e))?;
    }
    Ok(())
}

/// Appends `suffix` to the full file name, so `scenes.zip` becomes `scenes.zip.part`.
pub fn with_appended_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Size of the file at `path`, or zero when it does not exist.
pub fn existing_len(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(map_io(path, e)),
    }
}

pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(map_io(path, e)),
    }
}

/// Opens `path` for appending, or truncates it when `append` is false.
pub fn open_for_write(path: &Path, append: bool) -> Result<File> {
    let mut options = std::fs::OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path).map_err(|e| map_io(path, e))
}

/// Flushes the buffer and asks the OS to persist the file before it is dropped.
pub fn sync_and_close(mut writer: BufWriter<File>) -> Result<()> {
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Publishes `from` under the name `to` with a single rename on the same volume.
pub fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    std::fs::rename(from, to).map_err(|e| map_io(to, e))
}

/// True when `path` is relative and never climbs out of its base directory.
pub fn is_contained_relative(path: &Path) -> bool {
    let mut saw_normal = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => saw_normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    saw_normal
}

/// True when an archive entry path stays inside the extraction directory.
/// Entries such as `./` that name the directory itself are allowed.
pub fn is_safe_entry_path(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_with_appended_suffix() {
        assert_eq!(
            with_appended_suffix(Path::new("/data/data/scenes.zip"), ".part"),
            PathBuf::from("/data/data/scenes.zip.part")
        );
        assert_eq!(
            with_appended_suffix(Path::new("noext"), ".part"),
            PathBuf::from("noext.part")
        );
    }

    #[test]
    fn test_existing_len_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(existing_len(&dir.path().join("absent")).unwrap(), 0);
    }

    #[test]
    fn test_open_for_write_append_and_truncate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"abc").unwrap();

        let mut f = open_for_write(&path, true).unwrap();
        f.write_all(b"def").unwrap();
        drop(f);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");

        let mut f = open_for_write(&path, false).unwrap();
        f.write_all(b"x").unwrap();
        drop(f);
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }

    #[test]
    fn test_is_contained_relative() {
        assert!(is_contained_relative(Path::new("data/scenes.zip")));
        assert!(is_contained_relative(Path::new("./a/b")));
        assert!(!is_contained_relative(Path::new("../escape")));
        assert!(!is_contained_relative(Path::new("a/../../b")));
        assert!(!is_contained_relative(Path::new("/etc/passwd")));
        assert!(!is_contained_relative(Path::new("")));
    }

    #[test]
    fn test_is_safe_entry_path() {
        assert!(is_safe_entry_path(Path::new("./")));
        assert!(is_safe_entry_path(Path::new("./nested/file.txt")));
        assert!(is_safe_entry_path(Path::new("scenes/scene01.mat")));
        assert!(!is_safe_entry_path(Path::new("../escape")));
        assert!(!is_safe_entry_path(Path::new("./a/../../b")));
        assert!(!is_safe_entry_path(Path::new("/etc/passwd")));
    }
}
