// Tests for sweep coordination

use std::time::Duration;
use sweeper_core::report::{ReportFormat, gather_report_data, generate_report};
use sweeper_core::{SweepCoordinator, SweepOptions};
use sweeper_scanner::SweepError;
use sweeper_scanner::events::SweepEvent;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::path,
};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn small_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html(
            r#"<img src="/logo.png"><a href="/about">About</a><a href="/gone">Gone</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(path("/about"))
        .respond_with(html(r#"<a href="/">Home</a>"#))
        .mount(&server)
        .await;
    Mock::given(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNG".to_vec()))
        .mount(&server)
        .await;
    server
}

fn options(server: &MockServer, tmp: &TempDir) -> SweepOptions {
    let mut options = SweepOptions::new(server.uri());
    options.output_dir = tmp.path().join("offline_pages");
    options
}

// ============================================================================
// Coordinator Tests
// ============================================================================

#[tokio::test]
async fn test_sweep_mirrors_and_audits() {
    let server = small_site().await;
    let tmp = TempDir::new().unwrap();
    let coordinator = SweepCoordinator::new();

    let handle = coordinator.start(options(&server, &tmp)).unwrap();
    let report = handle.wait().await.unwrap();

    assert_eq!(report.outcome.mirror.pages.len(), 2);
    assert_eq!(report.outcome.mirror.failed.len(), 1);
    assert_eq!(report.outcome.mirror.resources.len(), 1);
    assert_eq!(report.working_count(), 2);
    assert_eq!(report.broken_count(), 1);
    assert_eq!(report.exit_code(), 1);
    assert!(report.index_path().is_file());
    assert!(!coordinator.is_busy());
}

#[tokio::test]
async fn test_second_start_while_running_is_busy() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html("slow").set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let coordinator = SweepCoordinator::new();

    let first = coordinator.start(options(&server, &tmp)).unwrap();
    assert!(coordinator.is_busy());

    let second = coordinator.start(options(&server, &tmp));
    assert!(matches!(second, Err(SweepError::Busy)));

    first.wait().await.unwrap();
    assert!(!coordinator.is_busy());

    let third = coordinator.start(options(&server, &tmp)).unwrap();
    third.wait().await.unwrap();
}

#[tokio::test]
async fn test_invalid_seed_is_rejected_before_start() {
    let tmp = TempDir::new().unwrap();
    let coordinator = SweepCoordinator::new();

    let mut options = SweepOptions::new("   ");
    options.output_dir = tmp.path().join("offline_pages");

    let result = coordinator.start(options);
    assert!(matches!(result, Err(SweepError::InvalidInput(_))));
    assert!(!coordinator.is_busy());
    assert!(!tmp.path().join("offline_pages").exists());
}

#[tokio::test]
async fn test_cancel_ends_with_cancelled_and_frees_slot() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html(r#"<a href="/next">Next</a>"#).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let coordinator = SweepCoordinator::new();

    let handle = coordinator.start(options(&server, &tmp)).unwrap();
    handle.cancel();

    let result = handle.wait().await;
    assert!(matches!(result, Err(SweepError::Cancelled)));
    assert!(!coordinator.is_busy());
}

#[tokio::test]
async fn test_rerun_replaces_output_tree() {
    let server = small_site().await;
    let tmp = TempDir::new().unwrap();
    let options = options(&server, &tmp);

    std::fs::create_dir_all(options.output_dir.join("assets")).unwrap();
    std::fs::write(options.output_dir.join("stale.html"), "old").unwrap();
    std::fs::write(options.output_dir.join("assets").join("old.css"), "old").unwrap();

    let coordinator = SweepCoordinator::new();
    coordinator.start(options.clone()).unwrap().wait().await.unwrap();

    assert!(!options.output_dir.join("stale.html").exists());
    assert!(!options.output_dir.join("assets").join("old.css").exists());
    assert!(options.output_dir.join("index.html").is_file());
}

#[tokio::test]
async fn test_events_stream_until_completion() {
    let server = small_site().await;
    let tmp = TempDir::new().unwrap();
    let coordinator = SweepCoordinator::new();

    let mut handle = coordinator.start(options(&server, &tmp)).unwrap();

    let mut lines = Vec::new();
    let mut progress = 0;
    let mut completed = None;
    while let Some(event) = handle.next_event().await {
        match event {
            SweepEvent::Progress { .. } => progress += 1,
            SweepEvent::Completed { working, broken } => completed = Some((working, broken)),
            SweepEvent::Log { .. } => lines.extend(event.log_line()),
        }
    }
    handle.wait().await.unwrap();

    assert_eq!(completed, Some((2, 1)));
    // Three pages mirrored, three links audited.
    assert_eq!(progress, 6);
    assert!(lines.iter().all(|l| l.starts_with('[')));
    assert!(lines.iter().any(|l| l.contains("Starting sweep...")));
    assert!(lines.iter().any(|l| l.contains("Saved page: index.html")));
    assert!(lines.iter().any(|l| l.contains("Broken link (HTTP 404 Not Found)")));
}

#[tokio::test]
async fn test_report_from_finished_sweep() {
    let server = small_site().await;
    let tmp = TempDir::new().unwrap();

    let report = SweepCoordinator::new()
        .start(options(&server, &tmp))
        .unwrap()
        .wait()
        .await
        .unwrap();

    let data = gather_report_data(&report);
    assert_eq!(data.sweep_id, report.id);
    assert_eq!(data.seed, format!("{}/", server.uri()));
    assert_eq!(data.pages_mirrored, 2);
    assert_eq!(data.broken[0].url, format!("{}/gone", server.uri()));

    let text = generate_report(&data, ReportFormat::Text).unwrap();
    assert!(text.contains("Finished! 2 working, 1 broken links"));
}
