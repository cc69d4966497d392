//! Progress reporting for transfers. Purely observational: nothing here affects
//! what ends up on disk.

use indicatif::{ProgressBar, ProgressStyle};

pub trait ProgressSink {
    /// Called once the expected total is known. `initial` is the resume offset.
    fn begin(&mut self, label: &str, total: Option<u64>, initial: u64);
    fn advance(&mut self, bytes: u64);
    fn finish(&mut self);
}

/// Discards all updates.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&mut self, _label: &str, _total: Option<u64>, _initial: u64) {}
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self) {}
}

/// Terminal byte bar. Shows a percentage when the total is known, a count-up otherwise.
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

fn style_for(total: Option<u64>) -> ProgressStyle {
    let template = match total {
        Some(_) => "{msg:20!} [{elapsed_precise}] {wide_bar} {bytes}/{total_bytes} ({percent}%, {bytes_per_sec}, eta {eta})",
        None => "{spinner} {msg:20!} [{elapsed_precise}] {bytes} ({bytes_per_sec})",
    };
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ProgressSink for BarProgress {
    fn begin(&mut self, label: &str, total: Option<u64>, initial: u64) {
        let bar = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        bar.set_style(style_for(total));
        bar.set_message(label.to_string());
        bar.set_position(initial);
        self.bar = Some(bar);
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
