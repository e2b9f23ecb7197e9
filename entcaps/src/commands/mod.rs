pub mod cache;
pub mod hash;
pub mod verify;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use entcaps_core::{read_profile, CapsConfig, DigestEngine, DiscoveryProfile};

/// Read a file, or stdin for "-".
pub(crate) fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut s = String::new();
        std::io::stdin()
            .read_to_string(&mut s)
            .context("Failed to read stdin")?;
        return Ok(s);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
}

pub(crate) fn load_profile(path: &str) -> Result<DiscoveryProfile> {
    let xml = read_input(path)?;
    read_profile(&xml).with_context(|| format!("Invalid disco#info document: {}", path))
}

/// Built-in providers plus whatever optional providers this binary was
/// compiled with.
pub(crate) fn build_engine() -> Result<Arc<DigestEngine>> {
    #[allow(unused_mut)]
    let mut builder = DigestEngine::builder();
    #[cfg(feature = "sha3")]
    {
        builder = builder.register_all(entcaps_core::digest::providers::sha3_providers())?;
    }
    #[cfg(feature = "blake2")]
    {
        builder = builder.register_all(entcaps_core::digest::providers::blake2_providers())?;
    }
    Ok(Arc::new(builder.build()))
}

/// Algorithms from the command line, else from the environment config.
pub(crate) fn algorithms_or_config(cli: &[String], config: &CapsConfig) -> Vec<String> {
    if cli.is_empty() {
        config.algorithms.clone()
    } else {
        cli.to_vec()
    }
}
