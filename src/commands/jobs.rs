use crate::core::config::Config;
use crate::core::download::part_path;
use crate::error::Result;
use crate::utils::fs;

/// Prints each job with the state of its files on the volume.
pub fn list_jobs(config: &Config) -> Result<()> {
    println!("Volume root: {}", config.volume_root.display());
    for job in &config.jobs {
        let destination = config.resolve_destination(job);
        let state = if destination.is_file() {
            "complete".to_string()
        } else {
            match fs::existing_len(&part_path(&destination))? {
                0 => "pending".to_string(),
                n => format!("partial, {n} bytes"),
            }
        };
        println!("  {} <- {} [{state}]", destination.display(), job.source);
    }
    Ok(())
}
