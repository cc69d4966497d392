use crate::core::archive::{self, ArchiveFormat};
use crate::core::config::Config;
use crate::core::download::Fetcher;
use crate::error::Result;
use std::path::Path;

/// Downloads a single URL outside the configured job list.
pub fn fetch_one(
    config: &Config,
    url: &str,
    destination: &Path,
    extract: bool,
    quiet: bool,
) -> Result<()> {
    let fetcher = Fetcher::new(config)?;
    let mut progress = super::progress_sink(quiet);
    let outcome = fetcher.fetch(url, destination, progress.as_mut())?;

    println!(
        "Downloaded {} ({} bytes)",
        destination.display(),
        outcome.final_len()
    );

    if extract && ArchiveFormat::detect(destination).is_some() {
        let report = archive::expand(destination)?;
        println!(
            "✔ Extracted {} into {}",
            destination.display(),
            report.target.display()
        );
    }
    Ok(())
}
