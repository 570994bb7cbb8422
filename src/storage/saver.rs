//! Disk persistence for fetched artifacts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use super::path_mapper::strategy_path;
use super::strategy::SaveStrategy;

/// Write fetched content under the output root per the chosen strategy.
///
/// Creates intermediate directories and seeds the per-host `.gitignore`.
/// Returns the path written.
pub async fn save_content(
    root: &Path,
    url: &Url,
    strategy: SaveStrategy,
    content: &[u8],
) -> Result<PathBuf> {
    let path = strategy_path(root, url, strategy)?;

    ensure_host_gitignore(&path, root).await?;

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("save path has no parent directory"))?;
    tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("failed to create {}", parent.display()))?;

    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}

/// Ensure a `.gitignore` exists in the host directory of the mirror.
///
/// The mirror content is excluded from version control while the
/// directory structure stays visible. Idempotent.
pub async fn ensure_host_gitignore(mirror_path: &Path, output_dir: &Path) -> Result<()> {
    let relative = mirror_path
        .strip_prefix(output_dir)
        .map_err(|e| anyhow::anyhow!("failed to strip output root prefix: {e}"))?;

    let host = relative
        .components()
        .next()
        .ok_or_else(|| anyhow::anyhow!("mirror path has no host component"))?;

    let host_dir = output_dir.join(host);
    let gitignore_path = host_dir.join(".gitignore");

    tokio::fs::create_dir_all(&host_dir)
        .await
        .with_context(|| format!("failed to create {}", host_dir.display()))?;

    if tokio::fs::try_exists(&gitignore_path)
        .await
        .with_context(|| format!("failed to check {}", gitignore_path.display()))?
    {
        return Ok(());
    }

    tokio::fs::write(&gitignore_path, "*\n!.gitignore\n")
        .await
        .with_context(|| format!("failed to write {}", gitignore_path.display()))?;

    log::debug!("Created .gitignore in {}", host_dir.display());

    Ok(())
}
