use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use entcaps_cache::{CapsCache, DirectoryStore};
use entcaps_core::{write_profile, CapsConfig};
use serde_json::json;

use super::{algorithms_or_config, build_engine, load_profile};
use crate::cli::CacheAction;

/// `entcaps cache ...` against `dir`, or ENTCAPS_CACHE_DIR.
pub fn run(dir: Option<PathBuf>, action: CacheAction, json: bool) -> Result<String> {
    let config = CapsConfig::from_env();
    let dir = dir
        .or_else(|| config.cache_dir.clone())
        .context("No cache directory: pass --dir or set ENTCAPS_CACHE_DIR")?;
    run_in(&dir, &config, action, json)
}

fn run_in(dir: &Path, config: &CapsConfig, action: CacheAction, json: bool) -> Result<String> {
    let store = match &action {
        CacheAction::Put { .. } => DirectoryStore::create(dir),
        _ => DirectoryStore::open(dir),
    }
    .with_context(|| format!("Cannot use cache directory {}", dir.display()))?;

    let engine = build_engine()?;
    let cache = CapsCache::new(Arc::clone(&engine), config);
    cache.set_persistent(Some(Arc::new(store.clone())));

    match action {
        CacheAction::Put {
            profile,
            algorithms,
        } => {
            let profile = load_profile(&profile)?;
            let algorithms = algorithms_or_config(&algorithms, config);
            let record = engine.hash_profile(&profile, &algorithms)?;
            let nodes: Vec<String> = record.node_ids().into_iter().map(|(_, n)| n).collect();
            for node in &nodes {
                cache.put_profile(node, profile.clone());
            }
            if json {
                return Ok(serde_json::to_string_pretty(&json!({ "stored": nodes }))?);
            }
            Ok(nodes.join("\n"))
        }
        CacheAction::Get { node } => {
            let profile = cache
                .get_profile(&node)
                .with_context(|| format!("No verified entry for {}", node))?;
            if json {
                return Ok(serde_json::to_string_pretty(&json!({
                    "node": node,
                    "profile": &*profile,
                }))?);
            }
            Ok(write_profile(&profile, Some(&node))?)
        }
        CacheAction::List => {
            let nodes = store.nodes()?;
            if json {
                return Ok(serde_json::to_string_pretty(&json!({ "nodes": nodes }))?);
            }
            Ok(nodes.join("\n"))
        }
        CacheAction::Clear { persistent } => {
            if !persistent {
                let stored = store.nodes()?.len();
                return Ok(format!(
                    "{} stored entries kept; pass --persistent to delete them",
                    stored
                ));
            }
            let removed = cache.clear_persistent()?;
            if json {
                return Ok(serde_json::to_string_pretty(&json!({ "removed": removed }))?);
            }
            Ok(format!("removed {} entries", removed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{write, SIMPLE_PROFILE, SIMPLE_SHA256};
    use entcaps_core::read_profile;

    fn put(dir: &Path, profile: &str) -> String {
        run_in(
            dir,
            &CapsConfig::default(),
            CacheAction::Put {
                profile: profile.to_string(),
                algorithms: vec!["sha-256".to_string()],
            },
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_put_get_list_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = write(tmp.path(), "p.xml", SIMPLE_PROFILE);
        let dir = tmp.path().join("cache");
        let config = CapsConfig::default();

        let node = put(&dir, &profile);
        assert_eq!(node, format!("urn:xmpp:caps#sha-256.{}", SIMPLE_SHA256));

        let doc = run_in(&dir, &config, CacheAction::Get { node: node.clone() }, false).unwrap();
        assert_eq!(read_profile(&doc).unwrap().features.len(), 17);

        let listed = run_in(&dir, &config, CacheAction::List, false).unwrap();
        assert_eq!(listed, node);

        let kept = run_in(&dir, &config, CacheAction::Clear { persistent: false }, false).unwrap();
        assert!(kept.starts_with("1 stored"));

        let cleared = run_in(&dir, &config, CacheAction::Clear { persistent: true }, false).unwrap();
        assert_eq!(cleared, "removed 1 entries");
        assert!(run_in(&dir, &config, CacheAction::Get { node }, false).is_err());
    }

    #[test]
    fn test_get_requires_existing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");
        let err = run_in(
            &missing,
            &CapsConfig::default(),
            CacheAction::Get {
                node: "urn:xmpp:caps#sha-256.x".to_string(),
            },
            false,
        );
        assert!(err.is_err());
    }
}
