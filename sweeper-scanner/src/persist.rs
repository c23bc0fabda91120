use crate::error::{Result, SweepError};
use crate::model::MirrorPage;
use crate::naming::{ASSETS_DIR, SEED_PAGE_NAME};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// The on-disk mirror: one HTML file per page plus a shared `assets/` directory.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
    assets: PathBuf,
}

impl OutputTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let assets = root.join(ASSETS_DIR);
        Self { root, assets }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(SEED_PAGE_NAME)
    }

    /// Delete the whole tree and recreate the empty directories.
    pub async fn reset(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() || self.root.parent().is_none() {
            return Err(SweepError::InvalidInput(format!(
                "refusing to wipe output directory '{}'",
                self.root.display()
            )));
        }

        match fs::remove_dir_all(&self.root).await {
            Ok(()) => debug!("Removed {}", self.root.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SweepError::filesystem(&self.root, e)),
        }

        fs::create_dir_all(&self.assets)
            .await
            .map_err(|e| SweepError::filesystem(&self.assets, e))?;
        Ok(())
    }

    pub async fn write_page(&self, page: &MirrorPage, html: &str) -> Result<PathBuf> {
        let path = self.root.join(&page.local_filename);
        fs::write(&path, html)
            .await
            .map_err(|e| SweepError::filesystem(&path, e))?;
        debug!("Saved page {} -> {}", page.source_url, path.display());
        Ok(path)
    }

    pub async fn write_asset(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.assets.join(name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| SweepError::filesystem(&path, e))?;
        Ok(path)
    }
}
