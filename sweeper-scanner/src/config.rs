use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Sweeper/0.1 (https://github.com/trapdoorsec/sweeper)";

/// How discovered anchors are tested against the seed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// Raw string prefix test. `https://x.com/a` also admits `https://x.com/ab`.
    Prefix,
    /// Same origin, and the path sits under the seed path at a `/` boundary.
    #[default]
    Strict,
}

/// How embedded resources are named inside `assets/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetNaming {
    /// Final path segment only. Two resources sharing a segment overwrite each other.
    Segment,
    /// URL hash prefix plus the final path segment.
    #[default]
    Hashed,
}

/// Base URL that relative anchors are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkResolution {
    /// Scheme, host and port of the seed.
    #[default]
    SiteRoot,
    /// The page the anchor was found on.
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub render_timeout_ms: u64,
    pub resource_timeout_ms: u64,
    pub audit_timeout_ms: u64,
    pub max_pages: Option<usize>,
    pub max_depth: Option<usize>,
    pub scope_mode: ScopeMode,
    pub asset_naming: AssetNaming,
    pub link_resolution: LinkResolution,
    pub resource_concurrency: usize,
    pub audit_concurrency: usize,
    pub user_agent: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            render_timeout_ms: 20_000,
            resource_timeout_ms: 5_000,
            audit_timeout_ms: 3_000,
            max_pages: Some(500),
            max_depth: None,
            scope_mode: ScopeMode::default(),
            asset_naming: AssetNaming::default(),
            link_resolution: LinkResolution::default(),
            resource_concurrency: 8,
            audit_concurrency: 8,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SweepConfig {
    /// Effective page cap. `0` means no limit, the same as `None`.
    pub fn page_limit(&self) -> Option<usize> {
        self.max_pages.filter(|&max| max > 0)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn resource_timeout(&self) -> Duration {
        Duration::from_millis(self.resource_timeout_ms)
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_timeout_ms)
    }
}
