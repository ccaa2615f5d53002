use indicatif::{ProgressBar, ProgressStyle};

/// Terminal progress bar for the execution fan-out.
///
/// Hidden when disabled so call sites never branch on it.
pub struct ProgressMonitor {
    overall: ProgressBar,
    enabled: bool,
    failed: u64,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                overall: ProgressBar::hidden(),
                enabled: false,
                failed: 0,
            };
        }

        let overall = ProgressBar::new(total_tasks as u64);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} queries ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        overall.set_style(style);
        overall.set_message("starting...");

        Self {
            overall,
            enabled: true,
            failed: 0,
        }
    }

    pub fn complete_task(&mut self, label: &str, success: bool) {
        if !self.enabled {
            return;
        }
        if !success {
            self.failed += 1;
        }
        self.overall.inc(1);
        if self.failed > 0 {
            self.overall
                .set_message(format!("{label} ({} failed)", self.failed));
        } else {
            self.overall.set_message(label.to_string());
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let msg = if success {
            "✅ execution complete"
        } else {
            "❌ execution finished with failures"
        };
        self.overall.finish_with_message(msg);
    }
}
