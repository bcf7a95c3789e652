use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

use super::tracker::{ProgressListener, ProgressSnapshot};

/// Renders tracker snapshots on a terminal progress bar.
///
/// Snapshots can arrive out of order, so the bar never moves backwards.
pub struct ProgressBarListener {
    bar: ProgressBar,
}

impl ProgressBarListener {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] {}: [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {{msg}}",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Self { bar }
    }

    /// A listener that draws nothing, for non-interactive output.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn finish(&self, message: &'static str) {
        self.bar.finish_with_message(message);
    }
}

#[async_trait]
impl ProgressListener for ProgressBarListener {
    async fn report_progress(&self, snapshot: ProgressSnapshot) -> Result<()> {
        let total = snapshot.total as u64;
        if self.bar.length().map_or(true, |len| len < total) {
            self.bar.set_length(total);
        }
        if (snapshot.completed as u64) > self.bar.position() {
            self.bar.set_position(snapshot.completed as u64);
        }
        Ok(())
    }
}
