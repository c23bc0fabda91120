use serde::{Deserialize, Serialize};

/// A page written to the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPage {
    pub source_url: String,
    pub local_filename: String,
    pub is_seed: bool,
}

/// An embedded resource stored under `assets/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub remote_url: String,
    /// Relative to the output root, e.g. `assets/logo.png`.
    pub local_path: String,
}

/// A page that was visited but could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPage {
    pub url: String,
    pub reason: String,
}
