//! Persistent tier: one `disco#info` document per capability node.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use entcaps_core::{read_profile, write_profile, DiscoveryProfile};

use crate::error::{Result, StoreError};

const FILE_EXTENSION: &str = "xml";

/// Durable node → profile storage.
///
/// Implementations need not verify what they return; [`crate::CapsCache`]
/// re-hashes every entry before trusting it.
pub trait PersistentCache: Send + Sync {
    fn put(&self, node: &str, profile: &DiscoveryProfile) -> Result<()>;

    /// `Ok(None)` when nothing is stored for `node`.
    fn lookup(&self, node: &str) -> Result<Option<DiscoveryProfile>>;

    /// Remove every stored entry and return how many were removed.
    fn clear(&self) -> Result<usize>;
}

/// Stores each node as `<hex(node)>.xml` inside one directory.
///
/// Node identifiers contain `#`, `/`, `+` and `=`; hex keeps file names
/// portable and reversible.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Open an existing directory. Missing paths and regular files are
    /// rejected rather than created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(StoreError::InvalidDirectory(dir));
        }
        Ok(Self { dir })
    }

    /// Create `dir` (and parents) if needed, then open it.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Self::open(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, node: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hex::encode(node.as_bytes()), FILE_EXTENSION))
    }

    /// Node identifiers of every stored entry, sorted.
    pub fn nodes(&self) -> Result<Vec<String>> {
        let mut nodes = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if let Some(node) = node_from_path(&path) {
                nodes.push(node);
            }
        }
        nodes.sort();
        Ok(nodes)
    }
}

fn node_from_path(path: &Path) -> Option<String> {
    if path.extension()? != FILE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

impl PersistentCache for DirectoryStore {
    fn put(&self, node: &str, profile: &DiscoveryProfile) -> Result<()> {
        let document = write_profile(profile, Some(node))?;
        // Write to a sibling temp file and rename, so readers never see a
        // half-written document.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(document.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.path_for(node)).map_err(|e| e.error)?;
        tracing::debug!(node = %node, dir = %self.dir.display(), "stored profile");
        Ok(())
    }

    fn lookup(&self, node: &str) -> Result<Option<DiscoveryProfile>> {
        let path = self.path_for(node);
        let document = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(read_profile(&document)?))
    }

    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if node_from_path(&path).is_some() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entcaps_core::Identity;

    fn profile() -> DiscoveryProfile {
        DiscoveryProfile::new()
            .with_identity(Identity::new("client", "bot"))
            .with_feature("urn:xmpp:ping")
    }

    #[test]
    fn test_open_rejects_missing_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            DirectoryStore::open(&missing),
            Err(StoreError::InvalidDirectory(_))
        ));
        let file = tmp.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            DirectoryStore::open(&file),
            Err(StoreError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn test_create_makes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(tmp.path().join("a").join("b")).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_put_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(tmp.path()).unwrap();
        let node = "urn:xmpp:caps#sha-256.a/b+c=";
        store.put(node, &profile()).unwrap();

        let path = store.path_for(node);
        assert!(path.is_file());
        assert_eq!(node_from_path(&path).as_deref(), Some(node));
        assert_eq!(store.lookup(node).unwrap(), Some(profile()));
        assert_eq!(store.lookup("urn:xmpp:caps#sha-256.other").unwrap(), None);
        assert_eq!(store.nodes().unwrap(), vec![node.to_string()]);
    }

    #[test]
    fn test_corrupted_document_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(tmp.path()).unwrap();
        let node = "urn:xmpp:caps#sha-256.x";
        fs::write(store.path_for(node), "<query").unwrap();
        assert!(matches!(store.lookup(node), Err(StoreError::Document(_))));
    }

    #[test]
    fn test_clear_only_removes_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(tmp.path()).unwrap();
        store.put("urn:xmpp:caps#sha-256.a", &profile()).unwrap();
        store.put("urn:xmpp:caps#sha-256.b", &profile()).unwrap();
        fs::write(tmp.path().join("README"), "keep").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.nodes().unwrap().is_empty());
        assert!(tmp.path().join("README").exists());
    }
}
