use anyhow::{bail, Result};
use std::env;
use std::path::Path;
use tracing::info;

use crate::Config;

pub async fn run(force: bool) -> Result<()> {
    let root = env::current_dir()?;
    init_at(&root, force)?;

    println!(
        "✓ Created {} with default configuration",
        Config::config_path(&root).display()
    );
    println!("\nNext steps:");
    println!("  1. Edit .refsearch/config.toml to customize settings");
    println!("  2. Run 'refsearch literal <pattern>' to search this directory");

    Ok(())
}

/// Write the default configuration under `root`.
pub fn init_at(root: &Path, force: bool) -> Result<()> {
    if Config::is_initialized(root) && !force {
        bail!(
            "refsearch is already initialized in {:?} (use --force to overwrite)",
            Config::config_dir(root)
        );
    }

    Config::default().save(root)?;
    info!("Initialized refsearch in {:?}", Config::config_dir(root));

    Ok(())
}
