//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for ingestion and comparison
#[derive(Debug)]
pub struct ProgressReporter {
    pub parse_pb: Option<ProgressBar>,
    pub table_pb: Option<ProgressBar>,
    show_progress: bool,
}

impl ProgressReporter {
    /// Create progress reporter for an ingestion run
    pub fn new_for_ingest() -> Self {
        Self {
            parse_pb: Some(create_spinner("Parsing file...")),
            table_pb: None,
            show_progress: true,
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            parse_pb: None,
            table_pb: None,
            show_progress: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.show_progress
    }

    /// Finish parsing
    pub fn finish_parse(&mut self, message: &str) {
        if let Some(pb) = self.parse_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Start a bar for one table's batched saves, replacing any previous one
    pub fn start_table(&mut self, table: &str, total: u64) {
        if !self.show_progress {
            return;
        }
        if let Some(pb) = self.table_pb.take() {
            pb.finish_and_clear();
        }
        self.table_pb = Some(create_progress_bar(total, table));
    }

    /// Advance the current table bar
    pub fn advance_table(&mut self, saved: u64) {
        if let Some(pb) = &self.table_pb {
            pb.inc(saved);
        }
    }

    /// Finish the current table bar
    pub fn finish_table(&mut self, message: &str) {
        if let Some(pb) = self.table_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.parse_pb.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.table_pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar with known total
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}
