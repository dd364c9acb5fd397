//! Progress bar display for downloads

use indicatif::{ProgressBar, ProgressStyle};

/// Byte progress for one object transfer.
///
/// Draws to stderr and stays hidden when stderr is not a terminal, so
/// non-interactive runs only see the log lines.
pub struct DownloadProgress {
    pb: ProgressBar,
}

impl DownloadProgress {
    /// Create a progress display; `total_bytes` is unknown when the server
    /// sends no content length
    pub fn new(name: &str, total_bytes: Option<u64>) -> Self {
        let pb = match total_bytes {
            Some(total) => {
                let style = ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-");
                let pb = ProgressBar::new(total);
                pb.set_style(style);
                pb
            }
            None => {
                let style = ProgressStyle::default_spinner()
                    .template("{spinner} {bytes} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                let pb = ProgressBar::new_spinner();
                pb.set_style(style);
                pb
            }
        };
        pb.set_message(shorten(name));
        Self { pb }
    }

    pub fn advance(&self, bytes: u64) {
        self.pb.inc(bytes);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.pb.abandon();
    }
}

/// Truncate long object names for display
fn shorten(name: &str) -> String {
    let count = name.chars().count();
    if count > 50 {
        let tail: String = name.chars().skip(count - 47).collect();
        format!("...{}", tail)
    } else {
        name.to_string()
    }
}
