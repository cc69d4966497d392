use crate::error::{Result, VolfetchError};
use crate::utils::fs;
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Archive;
use zip::ZipArchive;

/// Archive kinds that are unpacked after download, keyed by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandReport {
    pub archive: PathBuf,
    pub target: PathBuf,
    pub format: ArchiveFormat,
    pub entries: usize,
}

/// Extracts `archive` next to itself, into its parent directory.
pub fn expand(archive: &Path) -> Result<ExpandReport> {
    let target = archive
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    expand_into(archive, target)
}

pub fn expand_into(archive: &Path, target: &Path) -> Result<ExpandReport> {
    let format = ArchiveFormat::detect(archive).ok_or_else(|| VolfetchError::UnsupportedArchive {
        path: archive.to_path_buf(),
    })?;

    tracing::info!(archive = %archive.display(), target = %target.display(), ?format, "extracting");
    fs::ensure_dir_exists(target)?;

    let entries = match format {
        ArchiveFormat::Zip => extract_zip(archive, target)?,
        ArchiveFormat::TarGz => extract_tar_gz(archive, target)?,
    };

    Ok(ExpandReport {
        archive: archive.to_path_buf(),
        target: target.to_path_buf(),
        format,
        entries,
    })
}

fn unsafe_entry(archive: &Path, entry: &str) -> VolfetchError {
    VolfetchError::UnsafeArchiveEntry {
        archive: archive.to_path_buf(),
        entry: entry.to_string(),
    }
}

fn extract_zip(archive_path: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    // Reject the whole archive before writing anything if one entry escapes.
    let mut outpaths = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        match entry.enclosed_name() {
            Some(path) => outpaths.push(destination.join(path)),
            None => return Err(unsafe_entry(archive_path, entry.name())),
        }
    }

    for (i, outpath) in outpaths.iter().enumerate() {
        let mut file = archive.by_index(i)?;

        if file.is_dir() {
            fs::ensure_dir_exists(outpath)?;
        } else {
            if let Some(p) = outpath.parent() {
                fs::ensure_dir_exists(p)?;
            }
            let mut outfile = File::create(outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(outpath, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(outpaths.len())
}

fn extract_tar_gz(archive_path: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        if !fs::is_safe_entry_path(&path) {
            return Err(unsafe_entry(archive_path, &path.to_string_lossy()));
        }
        if !entry.unpack_in(destination)? {
            return Err(unsafe_entry(archive_path, &path.to_string_lossy()));
        }
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            // Write the raw name so tests can build entries `set_path` would refuse.
            let raw = &mut header.as_old_mut().name;
            raw[..name.len()].copy_from_slice(name.as_bytes());
            if name.ends_with('/') {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
            } else {
                header.set_mode(0o644);
            }
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder.append(&header, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_detect_format_by_suffix() {
        assert_eq!(ArchiveFormat::detect(Path::new("data/scenes.zip")), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::detect(Path::new("META.ZIP")), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::detect(Path::new("x.tar.gz")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::detect(Path::new("x.tgz")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::detect(Path::new("scenes.zip.part")), None);
        assert_eq!(ArchiveFormat::detect(Path::new("readme.txt")), None);
    }

    #[test]
    fn test_expand_zip_into_parent() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("scenes.zip");
        write_zip(
            &archive,
            &[("scene1/data.bin", b"\x00\x01\x02"), ("readme.txt", b"hello")],
        );

        let report = expand(&archive).unwrap();

        assert_eq!(report.entries, 2);
        assert_eq!(report.target, dir.path());
        assert_eq!(
            std::fs::read(dir.path().join("scene1/data.bin")).unwrap(),
            b"\x00\x01\x02"
        );
        assert_eq!(std::fs::read_to_string(dir.path().join("readme.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_expand_zip_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("inner");
        std::fs::create_dir_all(&inner).unwrap();
        let archive = inner.join("evil.zip");
        write_zip(&archive, &[("ok.txt", b"fine"), ("../escaped.txt", b"bad")]);

        let result = expand(&archive);

        assert!(matches!(result, Err(VolfetchError::UnsafeArchiveEntry { .. })));
        assert!(!dir.path().join("escaped.txt").exists());
        assert!(!inner.join("ok.txt").exists());
    }

    #[test]
    fn test_expand_corrupt_zip_fails() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.zip");
        std::fs::write(&archive, b"definitely not a zip archive").unwrap();

        assert!(matches!(expand(&archive), Err(VolfetchError::Zip(_))));
    }

    #[test]
    fn test_expand_tar_gz() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bundle.tar.gz");
        write_tar_gz(&archive, &[("nested/file.txt", b"tar contents")]);

        let report = expand(&archive).unwrap();

        assert_eq!(report.format, ArchiveFormat::TarGz);
        assert_eq!(report.entries, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("nested/file.txt")).unwrap(),
            "tar contents"
        );
    }

    #[test]
    fn test_expand_tar_gz_with_current_dir_entry() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bundle.tgz");
        write_tar_gz(
            &archive,
            &[
                ("./", b""),
                ("./nested/", b""),
                ("./nested/file.txt", b"packed with tar -C dir ."),
            ],
        );

        let report = expand(&archive).unwrap();

        assert_eq!(report.entries, 3);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("nested/file.txt")).unwrap(),
            "packed with tar -C dir ."
        );
    }

    #[test]
    fn test_expand_tar_gz_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("inner");
        std::fs::create_dir_all(&inner).unwrap();
        let archive = inner.join("evil.tgz");
        write_tar_gz(&archive, &[("../escaped.txt", b"bad")]);

        let result = expand(&archive);

        assert!(matches!(result, Err(VolfetchError::UnsafeArchiveEntry { .. })));
        assert!(!dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_expand_unsupported_suffix() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"plain").unwrap();

        assert!(matches!(
            expand(&file),
            Err(VolfetchError::UnsupportedArchive { .. })
        ));
    }
}
