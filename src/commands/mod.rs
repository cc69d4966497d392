pub mod extract;
pub mod fetch;
pub mod jobs;
pub mod run;

use crate::core::progress::{BarProgress, NoProgress, ProgressSink};

pub fn progress_sink(quiet: bool) -> Box<dyn ProgressSink> {
    if quiet {
        Box::new(NoProgress)
    } else {
        Box::new(BarProgress::new())
    }
}
