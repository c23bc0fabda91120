use crate::error::{FetchError, Result, SweepError};
use crate::events::{EventSink, Phase};
use crate::fetch::Fetcher;
use crate::result::{AuditEntry, AuditReport, CrawlResult};
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Checks whether each visited URL still answers with `200 OK`.
pub struct LinkAuditor {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    concurrency: usize,
}

impl LinkAuditor {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            fetcher,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Audit every URL once. Entries come back in the order of `urls`.
    pub async fn audit(
        &self,
        urls: &[String],
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<AuditReport> {
        let total = urls.len();
        let done = AtomicUsize::new(0);
        info!("Auditing {} links with {} workers", total, self.concurrency);

        let entries: Vec<Option<AuditEntry>> = stream::iter(urls)
            .map(|url| {
                let done = &done;
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let result = classify(self.fetcher.fetch_status(url, self.timeout).await);
                    let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                    events.progress(Phase::Audit, current, total, url);
                    if let CrawlResult::Broken { reason } = &result {
                        events.warn(format!("Broken link ({}): {}", reason, url));
                    }
                    Some(AuditEntry {
                        url: url.clone(),
                        result,
                    })
                }
            })
            .buffered(self.concurrency)
            .boxed()
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        Ok(AuditReport {
            entries: entries.into_iter().flatten().collect(),
        })
    }
}

/// `200` is working; every other status and every transport failure is broken.
pub fn classify(outcome: std::result::Result<u16, FetchError>) -> CrawlResult {
    match outcome {
        Ok(200) => CrawlResult::Working,
        Ok(code) => CrawlResult::broken(describe_status(code)),
        Err(FetchError::Status(code)) => CrawlResult::broken(describe_status(code)),
        Err(e) => CrawlResult::broken(e.to_string()),
    }
}

fn describe_status(code: u16) -> String {
    match StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("HTTP {} {}", code, reason),
        None => format!("HTTP {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SweepConfig;
    use crate::fetch::HttpClient;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn auditor(timeout: Duration) -> LinkAuditor {
        let fetcher = Arc::new(HttpClient::new(&SweepConfig::default()).unwrap());
        LinkAuditor::new(fetcher, timeout, 4)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Ok(200)), CrawlResult::Working);
        assert_eq!(classify(Ok(404)), CrawlResult::broken("HTTP 404 Not Found"));
        assert_eq!(classify(Ok(204)), CrawlResult::broken("HTTP 204 No Content"));
        assert_eq!(classify(Err(FetchError::Timeout)), CrawlResult::broken("timed out"));
        assert_eq!(
            classify(Err(FetchError::Transport("dns error".to_string()))),
            CrawlResult::broken("dns error")
        );
    }

    #[test]
    fn test_unknown_status_still_has_reason() {
        assert_eq!(classify(Ok(599)), CrawlResult::broken("HTTP 599"));
    }

    #[tokio::test]
    async fn test_audit_classifies_each_url() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let urls: Vec<String> = ["/ok", "/gone", "/slow"]
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect();

        let report = auditor(Duration::from_millis(100))
            .audit(&urls, &EventSink::silent(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries[0].url, urls[0]);
        assert_eq!(report.entries[0].result, CrawlResult::Working);
        assert_eq!(
            report.entries[1].result,
            CrawlResult::broken("HTTP 404 Not Found")
        );
        match &report.entries[2].result {
            CrawlResult::Broken { reason } => assert!(!reason.is_empty()),
            other => panic!("expected broken, got {:?}", other),
        }
        assert_eq!(report.working_count(), 1);
        assert_eq!(report.broken_count(), 2);
    }

    #[tokio::test]
    async fn test_audit_reports_progress() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        auditor(Duration::from_secs(2))
            .audit(&urls, &EventSink::new(tx), &CancellationToken::new())
            .await
            .unwrap();

        let mut progress = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let crate::events::SweepEvent::Progress {
                phase: Phase::Audit,
                current,
                total,
                ..
            } = event
            {
                progress.push((current, total));
            }
        }
        progress.sort();
        assert_eq!(progress, vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_cancelled_audit() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = auditor(Duration::from_secs(1))
            .audit(
                &["http://127.0.0.1:9/".to_string()],
                &EventSink::silent(),
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(SweepError::Cancelled)));
    }
}
