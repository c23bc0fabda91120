use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Mirror,
    Audit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
}

/// Everything a front-end needs to follow a sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SweepEvent {
    /// `total` is an estimate during the mirror phase: it grows as pages are discovered.
    Progress {
        phase: Phase,
        current: usize,
        total: usize,
        url: String,
    },
    Log {
        timestamp: DateTime<Local>,
        level: LogLevel,
        message: String,
    },
    Completed {
        working: usize,
        broken: usize,
    },
}

impl SweepEvent {
    /// `[HH:MM:SS] message` for log events, `None` otherwise.
    pub fn log_line(&self) -> Option<String> {
        match self {
            SweepEvent::Log {
                timestamp, message, ..
            } => Some(format!("[{}] {}", timestamp.format("%H:%M:%S"), message)),
            _ => None,
        }
    }
}

/// Sending half of the event stream. Every log event is mirrored to `tracing`.
///
/// A closed or absent receiver is not an error: the sweep keeps going.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<SweepEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<SweepEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that only logs through `tracing`.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn progress(&self, phase: Phase, current: usize, total: usize, url: &str) {
        self.send(SweepEvent::Progress {
            phase,
            current,
            total,
            url: url.to_string(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.log(LogLevel::Warn, message);
    }

    pub fn completed(&self, working: usize, broken: usize) {
        self.send(SweepEvent::Completed { working, broken });
    }

    fn log(&self, level: LogLevel, message: String) {
        self.send(SweepEvent::Log {
            timestamp: Local::now(),
            level,
            message,
        });
    }

    fn send(&self, event: SweepEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_events_reach_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);

        sink.progress(Phase::Mirror, 1, 3, "http://a.example/");
        sink.warn("Failed to download x");
        sink.completed(2, 1);

        assert!(matches!(
            rx.try_recv().unwrap(),
            SweepEvent::Progress { phase: Phase::Mirror, current: 1, total: 3, .. }
        ));
        let log = rx.try_recv().unwrap();
        assert!(log.log_line().unwrap().ends_with("] Failed to download x"));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SweepEvent::Completed { working: 2, broken: 1 }
        ));
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = EventSink::new(tx);
        sink.info("nobody is listening");
    }

    #[test]
    fn test_log_line_only_for_logs() {
        let event = SweepEvent::Completed {
            working: 0,
            broken: 0,
        };
        assert!(event.log_line().is_none());
    }
}
