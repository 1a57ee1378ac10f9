//! `slicedl config` – show where the config lives and what it holds.

use anyhow::{Context, Result};
use slicedl_core::config::{config_path, SlicedlConfig};

pub fn run_show_config(cfg: &SlicedlConfig) -> Result<()> {
    let path = config_path()?;
    println!("# {}", path.display());
    let text = toml::to_string_pretty(cfg).context("serialize config")?;
    print!("{}", text);
    Ok(())
}
