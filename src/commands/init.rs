use crate::config::STARTER_CONFIG;
use crate::io;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const STARTER_FILE_NAME: &str = "tsrgen.yaml";

/// Write the starter configuration into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(STARTER_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, STARTER_CONFIG)?;
    Ok(config_path)
}
