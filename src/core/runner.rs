use crate::core::archive::{self, ArchiveFormat, ExpandReport};
use crate::core::config::{Config, ExistingPolicy, TransferJob};
use crate::core::download::{FetchOutcome, Fetcher};
use crate::core::progress::ProgressSink;
use crate::error::{Result, VolfetchError};
use std::path::PathBuf;

/// Result of one job within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub destination: PathBuf,
    /// `None` when an already published destination was kept.
    pub fetched: Option<FetchOutcome>,
    pub expanded: Option<ExpandReport>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub jobs: Vec<JobReport>,
}

/// Runs the configured jobs one after another: fetch, then expand archives.
pub struct JobRunner {
    config: Config,
    fetcher: Fetcher,
    progress: Box<dyn ProgressSink>,
}

impl JobRunner {
    pub fn new(config: Config, progress: Box<dyn ProgressSink>) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            progress,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stops at the first failing job; its partial file stays on disk for the next run.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let jobs = self.config.jobs.clone();
        for job in &jobs {
            let destination = self.config.resolve_destination(job);
            let report = self
                .run_job(job, destination.clone())
                .map_err(|e| VolfetchError::job_failed(destination, e))?;
            summary.jobs.push(report);
        }
        Ok(summary)
    }

    fn run_job(&mut self, job: &TransferJob, destination: PathBuf) -> Result<JobReport> {
        let already_published = destination.is_file();
        let fetched = if already_published && self.config.existing == ExistingPolicy::Skip {
            tracing::info!(
                destination = %destination.display(),
                "destination already present, skipping download"
            );
            None
        } else {
            Some(
                self.fetcher
                    .fetch(&job.source, &destination, self.progress.as_mut())?,
            )
        };

        let expanded = match ArchiveFormat::detect(&destination) {
            Some(_) => {
                let report = archive::expand(&destination)?;
                println!(
                    "✔ Extracted {} into {}",
                    destination.display(),
                    report.target.display()
                );
                Some(report)
            }
            None => None,
        };

        Ok(JobReport {
            destination,
            fetched,
            expanded,
        })
    }
}
