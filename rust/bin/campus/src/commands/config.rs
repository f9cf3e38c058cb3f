//! `campus config` subcommands.

use std::path::Path;

use anyhow::Result;

use crate::config::ClientConfig;

/// Print the effective configuration (file plus overrides) as TOML.
pub fn show(config: &ClientConfig, path: &Path) -> Result<()> {
    let source = if path.exists() { "file" } else { "defaults" };
    println!("# {} ({})", path.display(), source);
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Write the effective configuration to `path`, creating parent directories.
pub fn init(config: &ClientConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    config.save(path)?;
    println!("Wrote {}.", path.display());
    Ok(())
}
