use crate::audit::LinkAuditor;
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::events::{EventSink, Phase};
use crate::fetch::{Fetcher, HttpClient, Renderer};
use crate::localize::ResourceLocalizer;
use crate::model::{FailedPage, MirrorPage};
use crate::naming::name_for;
use crate::persist::OutputTree;
use crate::result::{AuditReport, MirrorOutcome, SweepOutcome};
use crate::rewrite::rewrite_links;
use crate::scope::{Scope, parse_seed};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Drives one sweep: mirror every in-scope page reachable from the seed, then
/// audit the visited URLs.
pub struct Sweeper {
    config: SweepConfig,
    renderer: Arc<dyn Renderer>,
    fetcher: Arc<dyn Fetcher>,
    tree: OutputTree,
    events: EventSink,
    cancel: CancellationToken,
}

impl Sweeper {
    /// A sweeper that renders and fetches through one shared `HttpClient`.
    pub fn new(config: SweepConfig, tree: OutputTree) -> Result<Self> {
        let client = Arc::new(HttpClient::new(&config)?);
        Ok(Self {
            config,
            renderer: client.clone(),
            fetcher: client,
            tree,
            events: EventSink::silent(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn tree(&self) -> &OutputTree {
        &self.tree
    }

    /// Run a full sweep from raw user input.
    ///
    /// The seed is validated before the output tree is touched.
    pub async fn run(&self, seed: &str) -> Result<SweepOutcome> {
        let mut seed = parse_seed(seed)?;
        seed.set_fragment(None);

        self.tree.reset().await?;
        self.events.info("Cleaned output directory");
        self.events.info("Starting sweep...");

        let mirror = self.mirror(&seed).await?;
        let audit = self.audit(&mirror.visited).await?;

        let working = audit.working_count();
        let broken = audit.broken_count();
        self.events.info(format!(
            "Sweep completed. {} working, {} broken links",
            working, broken
        ));
        self.events.completed(working, broken);

        Ok(SweepOutcome {
            seed: seed.to_string(),
            mirror,
            audit,
        })
    }

    /// Mirror phase only. Expects an already reset output tree.
    pub async fn mirror(&self, seed: &Url) -> Result<MirrorOutcome> {
        let started = Instant::now();
        let scope = Scope::new(seed.clone(), self.config.scope_mode);
        let mut localizer = ResourceLocalizer::new(
            self.fetcher.clone(),
            self.tree.clone(),
            self.config.asset_naming,
            self.config.resource_timeout(),
            self.config.resource_concurrency,
        );

        info!(
            "Mirroring {} (scope: {:?}, max pages: {:?}, max depth: {:?})",
            seed,
            self.config.scope_mode,
            self.config.page_limit(),
            self.config.max_depth
        );

        let seed_url = scope.seed().to_string();
        let mut visited: HashSet<String> = HashSet::new();
        let mut outcome = MirrorOutcome::default();
        let mut frontier: VecDeque<(String, usize)> = VecDeque::new();

        visited.insert(seed_url.clone());
        outcome.visited.push(seed_url.clone());
        frontier.push_back((seed_url, 0));

        let page_limit = self.config.page_limit();
        let mut processed = 0;
        while let Some((url, depth)) = frontier.pop_front() {
            if self.cancel.is_cancelled() {
                info!("Mirror cancelled after {} pages", processed);
                return Err(SweepError::Cancelled);
            }

            processed += 1;
            self.events
                .progress(Phase::Mirror, processed, visited.len(), &url);
            self.events.info(format!("Fetching: {}", url));

            let html = match self
                .renderer
                .render(&url, self.config.render_timeout())
                .await
            {
                Ok(html) => html,
                Err(e) => {
                    self.events.warn(format!("Error fetching {}: {}", url, e));
                    outcome.failed.push(FailedPage {
                        url,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let page_url = Url::parse(&url)
                .map_err(|e| SweepError::Other(format!("frontier held unparsable URL {}: {}", url, e)))?;

            let html = localizer
                .localize(&html, &page_url, &self.events, &self.cancel)
                .await?;
            let rewritten = rewrite_links(&html, &page_url, &scope, self.config.link_resolution);

            let is_seed = scope.is_seed(&url);
            let page = MirrorPage {
                local_filename: name_for(&url, is_seed),
                source_url: url,
                is_seed,
            };
            self.tree.write_page(&page, &rewritten.html).await?;
            self.events
                .info(format!("Saved page: {}", page.local_filename));
            outcome.pages.push(page);

            if self.config.max_depth.is_some_and(|max| depth >= max) {
                debug!("Depth limit reached at depth {}", depth);
                continue;
            }

            for link in rewritten.links {
                if page_limit.is_some_and(|max| visited.len() >= max) {
                    debug!("Page limit reached, dropping remaining links");
                    break;
                }
                if visited.insert(link.clone()) {
                    outcome.visited.push(link.clone());
                    frontier.push_back((link, depth + 1));
                }
            }
        }

        outcome.resources = localizer.into_records();
        info!(
            "Mirror finished in {:.2}s: {} pages saved, {} failed, {} assets",
            started.elapsed().as_secs_f64(),
            outcome.pages.len(),
            outcome.failed.len(),
            outcome.resources.len()
        );
        Ok(outcome)
    }

    /// Audit phase only.
    pub async fn audit(&self, urls: &[String]) -> Result<AuditReport> {
        LinkAuditor::new(
            self.fetcher.clone(),
            self.config.audit_timeout(),
            self.config.audit_concurrency,
        )
        .audit(urls, &self.events, &self.cancel)
        .await
    }
}
