use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use sweeper_scanner::events::{LogLevel, Phase, SweepEvent};

/// Terminal view of a running sweep: one bar, log lines printed above it.
///
/// When disabled only warnings are shown, on stderr.
pub struct ProgressDisplay {
    bar: Option<ProgressBar>,
    phase: Option<Phase>,
}

impl ProgressDisplay {
    pub fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Starting sweep...");
            pb
        });
        Self { bar, phase: None }
    }

    pub fn handle(&mut self, event: &SweepEvent) {
        match event {
            SweepEvent::Progress {
                phase,
                current,
                total,
                url,
            } => self.progress(*phase, *current, *total, url),
            SweepEvent::Log { level, .. } => {
                if let Some(line) = event.log_line() {
                    self.println(*level, line);
                }
            }
            SweepEvent::Completed { .. } => {
                if let Some(ref bar) = self.bar {
                    bar.finish_and_clear();
                }
            }
        }
    }

    fn progress(&mut self, phase: Phase, current: usize, total: usize, url: &str) {
        let Some(ref bar) = self.bar else {
            return;
        };

        if self.phase != Some(phase) {
            self.phase = Some(phase);
            bar.set_style(match phase {
                // The frontier keeps growing while pages are mirrored.
                Phase::Mirror => spinner_style(),
                Phase::Audit => bar_style(),
            });
        }

        match phase {
            Phase::Mirror => {
                bar.set_message(format!("Mirroring [{}/{}] {}", current, total, url));
            }
            Phase::Audit => {
                bar.set_length(total as u64);
                bar.set_position(current as u64);
                bar.set_message(url.to_string());
            }
        }
    }

    fn println(&self, level: LogLevel, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None if level == LogLevel::Warn => eprintln!("{}", line),
            None => {}
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.cyan} Auditing [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}
