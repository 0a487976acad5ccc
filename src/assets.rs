// ABOUTME: Scoped asset staging for downloaded audio and images
// ABOUTME: Provides a per-run arena with content-derived names and cleanup

use crate::errors::Result;
use crate::utils::ensure_directory_exists;
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What kind of media an asset holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Audio,
    Image,
}

/// A staged media file tracked by the arena
#[derive(Debug, Clone)]
pub struct AssetHandle {
    pub path: PathBuf,
    pub kind: AssetKind,
    pub transient: bool,
}

/// A per-run staging directory for media assets.
///
/// Every run gets its own subdirectory so concurrent runs never collide.
/// Transient assets are deleted by `cleanup`; non-transient ones (the
/// fallback image) survive it.
pub struct AssetArena {
    root: PathBuf,
    handles: Vec<AssetHandle>,
}

impl AssetArena {
    /// Create the arena directory under the configured media directory
    pub fn create(media_dir: &Path) -> Result<Self> {
        let root = media_dir.join(format!("run-{}", Uuid::new_v4()));
        ensure_directory_exists(&root)?;
        debug!("Staging media assets in {:?}", root);
        Ok(Self {
            root,
            handles: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derive a stable filename stem from asset source text
    pub fn stem_for(text: &str) -> String {
        let digest = Sha256::digest(text.as_bytes());
        hex::encode(&digest[..5])
    }

    /// Path inside the arena for a transient asset derived from `text`
    pub fn transient_path(&self, text: &str, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::stem_for(text), extension))
    }

    /// Record an asset so cleanup can find it later
    pub fn register(&mut self, path: PathBuf, kind: AssetKind, transient: bool) -> AssetHandle {
        let handle = AssetHandle {
            path,
            kind,
            transient,
        };
        self.handles.push(handle.clone());
        handle
    }

    /// Delete transient assets and the run directory.
    ///
    /// Safe to call more than once; files already gone are not an error.
    pub fn cleanup(&mut self) {
        for handle in self.handles.drain(..) {
            if !handle.transient {
                continue;
            }
            match std::fs::remove_file(&handle.path) {
                Ok(()) => debug!("Removed transient asset {:?}", handle.path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove transient asset {:?}: {}", handle.path, e),
            }
        }
        // The directory only goes away once nothing else is left in it
        if let Err(e) = std::fs::remove_dir(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Leaving staging directory {:?} in place: {}", self.root, e);
            }
        }
    }
}
