//! Asset resolution
//!
//! Maps the names callers pass to `load` onto raw clip bytes. The pool
//! never touches the filesystem itself; it asks an [`AssetResolver`].

pub mod format;

pub use format::AudioFormat;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Asset resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No resource is registered under the name
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The resource exists but could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lookup from asset name to encoded clip bytes
pub trait AssetResolver {
    /// Resolve `name` to its raw bytes
    fn resolve(&self, name: &str) -> Result<Vec<u8>, ResolveError>;
}

impl<F> AssetResolver for F
where
    F: Fn(&str) -> Result<Vec<u8>, ResolveError>,
{
    fn resolve(&self, name: &str) -> Result<Vec<u8>, ResolveError> {
        self(name)
    }
}

/// Resolver over an in-memory table
#[derive(Debug, Default, Clone)]
pub struct MemoryResolver {
    clips: HashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register clip bytes under `name`, replacing any previous entry
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.clips.insert(name.into(), bytes);
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Result<Vec<u8>, ResolveError> {
        self.clips
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

/// Resolver over a directory of clip files
///
/// A name maps to `<root>/<name>` or `<root>/<name>.<ext>` for each known
/// audio extension, like raw resources bundled with an application.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    /// Create a resolver rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the resolver searches
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the file backing `name`, if any
    fn locate(&self, name: &str) -> Option<PathBuf> {
        // Names are resource identifiers, never paths
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }

        let bare = self.root.join(name);
        if bare.is_file() {
            return Some(bare);
        }

        AudioFormat::EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|candidate| candidate.is_file())
    }
}

impl AssetResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Result<Vec<u8>, ResolveError> {
        let path = self
            .locate(name)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;
        log::debug!("Resolved {} to {}", name, path.display());
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sound_pool_{}_{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_memory_resolver() {
        let resolver = MemoryResolver::new().with("laser", b"RIFF1234".to_vec());
        assert_eq!(resolver.resolve("laser").unwrap(), b"RIFF1234".to_vec());
        assert!(matches!(resolver.resolve("missing"), Err(ResolveError::NotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| -> Result<Vec<u8>, ResolveError> {
            if name == "beep" {
                Ok(vec![1, 2, 3])
            } else {
                Err(ResolveError::NotFound(name.to_string()))
            }
        };
        assert_eq!(resolver.resolve("beep").unwrap(), vec![1, 2, 3]);
        assert!(resolver.resolve("boop").is_err());
    }

    #[test]
    fn test_directory_resolver_extensions() {
        let dir = scratch_dir("ext");
        fs::write(dir.join("piano_c5.ogg"), b"OggS....").unwrap();
        fs::write(dir.join("click"), b"RIFF....").unwrap();

        let resolver = DirectoryResolver::new(&dir);
        assert_eq!(resolver.resolve("piano_c5").unwrap(), b"OggS....".to_vec());
        assert_eq!(resolver.resolve("click").unwrap(), b"RIFF....".to_vec());
        assert!(matches!(resolver.resolve("piano_d5"), Err(ResolveError::NotFound(_))));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_directory_resolver_rejects_paths() {
        let dir = scratch_dir("paths");
        let resolver = DirectoryResolver::new(&dir);
        assert!(matches!(resolver.resolve("../secret"), Err(ResolveError::NotFound(_))));
        assert!(matches!(resolver.resolve("a/b"), Err(ResolveError::NotFound(_))));
        assert!(matches!(resolver.resolve(""), Err(ResolveError::NotFound(_))));
        fs::remove_dir_all(dir).unwrap();
    }
}
