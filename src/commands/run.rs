use crate::core::config::Config;
use crate::core::runner::JobRunner;
use crate::error::Result;

pub fn run_jobs(config: Config, quiet: bool) -> Result<()> {
    let job_count = config.jobs.len();
    tracing::info!(
        volume_root = %config.volume_root.display(),
        jobs = job_count,
        "starting run"
    );

    let mut runner = JobRunner::new(config, super::progress_sink(quiet))?;
    let summary = runner.run()?;

    let extracted = summary.jobs.iter().filter(|j| j.expanded.is_some()).count();
    println!("✅ Completed {job_count} job(s), extracted {extracted} archive(s)");
    Ok(())
}
