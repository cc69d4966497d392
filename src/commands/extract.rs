use crate::core::archive;
use crate::error::Result;
use std::path::Path;

pub fn extract_archive(archive_path: &Path, into: Option<&Path>) -> Result<()> {
    let report = match into {
        Some(target) => archive::expand_into(archive_path, target)?,
        None => archive::expand(archive_path)?,
    };
    println!(
        "✔ Extracted {} entries from {} into {}",
        report.entries,
        archive_path.display(),
        report.target.display()
    );
    Ok(())
}
