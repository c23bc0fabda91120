use crate::model::{FailedPage, MirrorPage, ResourceRecord};
use serde::{Deserialize, Serialize};

/// Outcome of auditing a single visited URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CrawlResult {
    Working,
    Broken { reason: String },
}

impl CrawlResult {
    pub fn broken(reason: impl Into<String>) -> Self {
        CrawlResult::Broken {
            reason: reason.into(),
        }
    }

    pub fn is_working(&self) -> bool {
        matches!(self, CrawlResult::Working)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub url: String,
    #[serde(flatten)]
    pub result: CrawlResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// One entry per visited URL, in visit order.
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    pub fn working(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(|e| e.result.is_working())
    }

    pub fn broken(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(|e| !e.result.is_working())
    }

    pub fn working_count(&self) -> usize {
        self.working().count()
    }

    pub fn broken_count(&self) -> usize {
        self.broken().count()
    }

    pub fn get(&self, url: &str) -> Option<&CrawlResult> {
        self.entries
            .iter()
            .find(|e| e.url == url)
            .map(|e| &e.result)
    }
}

/// What the mirror phase produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorOutcome {
    /// Every URL that entered the visited set, in insertion order.
    pub visited: Vec<String>,
    pub pages: Vec<MirrorPage>,
    pub failed: Vec<FailedPage>,
    pub resources: Vec<ResourceRecord>,
}

/// A finished sweep: the mirror plus the audit of everything it visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub seed: String,
    pub mirror: MirrorOutcome,
    pub audit: AuditReport,
}
