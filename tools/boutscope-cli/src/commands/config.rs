//! Show or save the effective configuration.

use std::path::PathBuf;

use anyhow::Context;

use boutscope_common::config::AppConfig;

pub fn run(write: bool, path: Option<PathBuf>, config: &AppConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);

    if write {
        let saved = match path {
            Some(path) => {
                config
                    .save_to(&path)
                    .with_context(|| format!("Failed to save config to {}", path.display()))?;
                path
            }
            None => config.save().context("Failed to save config")?,
        };
        println!("Config written to: {}", saved.display());
    }
    Ok(())
}
