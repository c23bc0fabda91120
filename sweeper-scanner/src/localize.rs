use crate::config::AssetNaming;
use crate::error::{Result, SweepError};
use crate::events::EventSink;
use crate::fetch::Fetcher;
use crate::html::replace_attribute_values;
use crate::model::ResourceRecord;
use crate::naming::{asset_href, asset_name_for};
use crate::persist::OutputTree;
use crate::scope::resolve_href;
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Elements whose attribute points at an embedded resource.
const RESOURCE_ATTRIBUTES: [(&str, &str); 3] = [("img", "src"), ("link", "href"), ("script", "src")];

/// `<link rel=…>` values that point at other documents rather than resources.
const NAVIGATIONAL_RELS: [&str; 9] = [
    "canonical",
    "alternate",
    "next",
    "prev",
    "author",
    "help",
    "license",
    "search",
    "bookmark",
];

static RESOURCE_SELECTORS: LazyLock<Vec<(&'static str, &'static str, Selector)>> =
    LazyLock::new(|| {
        RESOURCE_ATTRIBUTES
            .iter()
            .map(|(tag, attr)| {
                let selector = Selector::parse(&format!("{}[{}]", tag, attr))
                    .expect("resource selectors are valid CSS");
                (*tag, *attr, selector)
            })
            .collect()
    });

#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    tag: &'static str,
    attr: &'static str,
    value: String,
}

/// Downloads the images, stylesheets and scripts a page embeds into the shared
/// `assets/` directory and points the page at the local copies.
///
/// Each remote URL is fetched at most once per sweep. Failed downloads are
/// remembered too, so they are not retried on later pages.
pub struct ResourceLocalizer {
    fetcher: Arc<dyn Fetcher>,
    tree: OutputTree,
    naming: AssetNaming,
    timeout: Duration,
    concurrency: usize,
    cache: HashMap<String, Option<String>>,
    records: Vec<ResourceRecord>,
}

impl ResourceLocalizer {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        tree: OutputTree,
        naming: AssetNaming,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            tree,
            naming,
            timeout,
            concurrency: concurrency.max(1),
            cache: HashMap::new(),
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ResourceRecord> {
        self.records
    }

    /// Localize every embedded resource of `html`, resolved against `base`.
    ///
    /// Download failures leave the original reference in place. Only a failed
    /// write to the asset directory (or cancellation) is an error.
    pub async fn localize(
        &mut self,
        html: &str,
        base: &Url,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let references = collect_references(html);

        let mut planned: Vec<(Reference, String)> = Vec::new();
        let mut to_fetch: Vec<(String, String)> = Vec::new();
        for reference in references {
            let Some(remote) = resolve_href(base, &reference.value) else {
                continue;
            };
            let Some(name) = asset_name_for(&remote, self.naming) else {
                continue;
            };
            let remote = remote.to_string();
            if !self.cache.contains_key(&remote) && !to_fetch.iter().any(|(url, _)| *url == remote)
            {
                to_fetch.push((remote.clone(), name.clone()));
            }
            planned.push((reference, remote));
        }

        let fetcher = self.fetcher.clone();
        let timeout = self.timeout;
        let downloads: Vec<_> = stream::iter(to_fetch)
            .map(|(url, name)| {
                let fetcher = fetcher.clone();
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    events.info(format!("Downloading resource: {}", url));
                    let outcome = fetcher.fetch_bytes(&url, timeout).await;
                    Some((url, name, outcome))
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        for (url, name, outcome) in downloads.into_iter().flatten() {
            match outcome {
                Ok(bytes) => {
                    self.tree.write_asset(&name, &bytes).await?;
                    let href = asset_href(&name);
                    self.records.push(ResourceRecord {
                        remote_url: url.clone(),
                        local_path: href.clone(),
                    });
                    self.cache.insert(url, Some(href));
                }
                Err(e) => {
                    events.warn(format!("Failed to download {}: {}", url, e));
                    self.cache.insert(url, None);
                }
            }
        }

        let mut replacements: HashMap<(&str, &str), HashMap<String, String>> = HashMap::new();
        for (reference, remote) in planned {
            if let Some(Some(href)) = self.cache.get(&remote) {
                replacements
                    .entry((reference.tag, reference.attr))
                    .or_default()
                    .insert(reference.value, href.clone());
            }
        }

        let mut output = html.to_string();
        for ((tag, attr), values) in &replacements {
            output = replace_attribute_values(&output, tag, attr, values);
        }
        Ok(output)
    }
}

fn collect_references(html: &str) -> Vec<Reference> {
    let document = Html::parse_document(html);
    let mut references = Vec::new();

    for &(tag, attr, ref selector) in RESOURCE_SELECTORS.iter() {
        for element in document.select(selector) {
            if tag == "link" && is_navigational(element.value().attr("rel")) {
                continue;
            }
            if let Some(value) = element.value().attr(attr) {
                references.push(Reference {
                    tag,
                    attr,
                    value: value.to_string(),
                });
            }
        }
    }

    references
}

fn is_navigational(rel: Option<&str>) -> bool {
    rel.is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| NAVIGATIONAL_RELS.iter().any(|nav| token.eq_ignore_ascii_case(nav)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use crate::config::SweepConfig;
    use crate::events::SweepEvent;
    use crate::fetch::HttpClient;

    async fn localizer(tmp: &TempDir, naming: AssetNaming) -> ResourceLocalizer {
        let tree = OutputTree::new(tmp.path().join("out"));
        tree.reset().await.unwrap();
        let fetcher = Arc::new(HttpClient::new(&SweepConfig::default()).unwrap());
        ResourceLocalizer::new(fetcher, tree, naming, Duration::from_secs(2), 4)
    }

    #[test]
    fn test_collect_references_skips_navigational_links() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/style.css">
            <link rel="canonical" href="/home">
            <script src="/app.js"></script>
            <script>inline()</script>
            </head><body><img src="/logo.png"><img alt="no source"></body></html>"#;
        let mut values: Vec<String> = collect_references(html)
            .into_iter()
            .map(|r| r.value)
            .collect();
        values.sort();
        assert_eq!(values, vec!["/app.js", "/logo.png", "/style.css"]);
    }

    #[tokio::test]
    async fn test_localizes_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/x.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89u8, b'P', b'N', b'G']))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let mut localizer = localizer(&tmp, AssetNaming::Segment).await;
        let base = Url::parse(&server.uri()).unwrap();
        let html = format!(r#"<img src="{}/img/x.png">"#, server.uri());

        let out = localizer
            .localize(&html, &base, &EventSink::silent(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, r#"<img src="assets/x.png">"#);
        let stored = std::fs::read(tmp.path().join("out/assets/x.png")).unwrap();
        assert_eq!(stored, vec![0x89u8, b'P', b'N', b'G']);
        assert_eq!(localizer.records().len(), 1);
        assert_eq!(localizer.records()[0].local_path, "assets/x.png");
    }

    #[tokio::test]
    async fn test_failed_download_keeps_remote_reference() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/x.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let mut localizer = localizer(&tmp, AssetNaming::Segment).await;
        let base = Url::parse(&server.uri()).unwrap();
        let html = format!(r#"<img src="{}/img/x.png">"#, server.uri());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let out = localizer
            .localize(&html, &base, &EventSink::new(tx), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, html);
        assert!(!tmp.path().join("out/assets/x.png").exists());
        assert!(localizer.records().is_empty());

        let mut warned = false;
        while let Ok(event) = rx.try_recv() {
            if let SweepEvent::Log { message, .. } = event {
                warned |= message.starts_with("Failed to download");
            }
        }
        assert!(warned);
    }

    #[tokio::test]
    async fn test_relative_references_resolve_against_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/style.css"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"body{}".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/js/app.js"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"run()".to_vec()))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let mut localizer = localizer(&tmp, AssetNaming::Segment).await;
        let base = Url::parse(&format!("{}/docs/page", server.uri())).unwrap();
        let html = r#"<link rel="stylesheet" href="style.css"><script src="/js/app.js"></script>"#;

        let out = localizer
            .localize(html, &base, &EventSink::silent(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            out,
            r#"<link rel="stylesheet" href="assets/style.css"><script src="assets/app.js"></script>"#
        );
    }

    #[tokio::test]
    async fn test_resource_fetched_once_per_sweep() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8]))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let mut localizer = localizer(&tmp, AssetNaming::Hashed).await;
        let base = Url::parse(&server.uri()).unwrap();
        let html = r#"<img src="/logo.png"><img src="/logo.png">"#;
        let cancel = CancellationToken::new();

        let first = localizer
            .localize(html, &base, &EventSink::silent(), &cancel)
            .await
            .unwrap();
        let second = localizer
            .localize(html, &base, &EventSink::silent(), &cancel)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(localizer.records().len(), 1);
        assert!(localizer.records()[0].local_path.ends_with("-logo.png"));
    }

    #[tokio::test]
    async fn test_hashed_naming_avoids_collisions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"A".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"B".to_vec()))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let mut localizer = localizer(&tmp, AssetNaming::Hashed).await;
        let base = Url::parse(&server.uri()).unwrap();
        let html = r#"<img src="/a/logo.png"><img src="/b/logo.png">"#;

        localizer
            .localize(html, &base, &EventSink::silent(), &CancellationToken::new())
            .await
            .unwrap();

        let stored = std::fs::read_dir(tmp.path().join("out/assets"))
            .unwrap()
            .count();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn test_data_uris_and_bare_directories_are_left_alone() {
        let tmp = TempDir::new().unwrap();
        let mut localizer = localizer(&tmp, AssetNaming::Segment).await;
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let html = r#"<img src="data:image/png;base64,AAAA"><link rel="icon" href="/">"#;

        let out = localizer
            .localize(html, &base, &EventSink::silent(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, html);
    }

    #[tokio::test]
    async fn test_cancelled_localize_stops() {
        let tmp = TempDir::new().unwrap();
        let mut localizer = localizer(&tmp, AssetNaming::Segment).await;
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = localizer
            .localize(r#"<img src="/x.png">"#, &base, &EventSink::silent(), &cancel)
            .await;
        assert!(matches!(result, Err(SweepError::Cancelled)));
    }
}
