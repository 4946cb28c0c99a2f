use std::io::Write;

use colored::Colorize;
use model_scorer::models::select_latest;
use model_scorer::{LoadError, ModelLoader, ScorerConfig};

/// One line per version, newest first, the one `predict` would use marked `(latest)`.
pub fn handle_command(config: &ScorerConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let loader = ModelLoader::from_config(config);
    let mut versions = loader.versions()?;
    let Some(latest) = select_latest(&versions).map(|v| v.version) else {
        return Err(LoadError::NotFound(config.model_name().to_string()).into());
    };

    versions.sort_by(|a, b| b.version.cmp(&a.version));
    log::info!(
        "{} version(s) of '{}' at {}",
        versions.len(),
        config.model_name(),
        config.tracking_uri()
    );

    for version in &versions {
        let status = version
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        let stage = version.stage.as_deref().unwrap_or("None");
        let line = format!("{:>6}  {:<22} {}", version.version, status, stage);
        if version.version == latest {
            writeln!(out, "{} {}", line.bold(), "(latest)".green())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }

    Ok(())
}
