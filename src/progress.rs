//! Progress bar display for archive downloads

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress display for a single download
pub struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    /// A progress bar drawn on stderr, or a hidden one when stderr is not a terminal
    pub fn new(name: &str) -> Self {
        let bar = if console::Term::stderr().is_term() {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(name.to_string());
        Self { bar }
    }

    /// Set the expected size once the server reports it
    pub fn set_length(&self, total_bytes: Option<u64>) {
        match total_bytes {
            Some(total) if total > 0 => {
                self.bar.set_length(total);
                self.bar.set_style(
                    ProgressStyle::with_template(
                        "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
                    )
                    .map(|style| style.progress_chars("#>-"))
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
            }
            _ => {
                self.bar.set_style(
                    ProgressStyle::with_template("{msg} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
            }
        }
    }

    pub fn set_position(&self, bytes: u64) {
        self.bar.set_position(bytes);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lifecycle_without_terminal() {
        let progress = DownloadProgress::new("simple-2.0.tar.gz");
        progress.set_length(Some(100));
        progress.set_position(50);
        progress.finish();

        let unknown = DownloadProgress::new("simple-2.0.tar.gz");
        unknown.set_length(None);
        unknown.abandon();
    }
}
