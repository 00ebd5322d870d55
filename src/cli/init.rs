use crate::Config;
use anyhow::Result;
use std::path::Path;

pub async fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, Config::default_toml())?;

    tracing::info!("Wrote {}", path.display());
    Ok(())
}
