use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of bundled model blobs, addressed by asset name.
pub trait AssetStore: Send + Sync {
    fn open_asset(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Read an asset fully into memory.
    fn read_asset(&self, name: &str) -> io::Result<Vec<u8>> {
        let mut reader = self.open_asset(name)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Assets stored as files under one directory.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        // Only plain relative names; no escaping the asset directory.
        let plain = relative
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if name.is_empty() || !plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid asset name '{}'", name),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetStore for DirAssetStore {
    fn open_asset(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = self.resolve(name)?;
        tracing::debug!(path = %path.display(), "Opening model asset");
        Ok(Box::new(File::open(path)?))
    }
}

/// Assets held in memory, e.g. blobs embedded with `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    assets: HashMap<String, Arc<[u8]>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.assets.insert(name.into(), bytes.into());
    }
}

impl AssetStore for MemoryAssetStore {
    fn open_asset(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let bytes = self.assets.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset named '{}'", name))
        })?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}
