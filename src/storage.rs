// SPDX-License-Identifier: GPL-3.0-only

//! Debug image storage
//!
//! Frames that fail to decode can be written out as PNG for offline
//! inspection. Writing goes through [`FileStore`] so tests and embedders
//! can keep dumps in memory or send them elsewhere.

use crate::constants::debug_dump;
use crate::errors::{ScanError, ScanResult};
use crate::processor::PixelBuffer;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Persistence backend for debug images
pub trait FileStore: Send + Sync {
    fn write_file(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
}

impl<S: FileStore + ?Sized> FileStore for Arc<S> {
    fn write_file(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        (**self).write_file(path, bytes)
    }
}

/// Writes to the local filesystem, creating parent directories
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FileStore for FsStore {
    fn write_file(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)
    }
}

/// Keeps written files in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a written file
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    /// Paths written so far
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileStore for MemoryStore {
    fn write_file(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        self.lock().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}

/// How debug image files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpNaming {
    /// Always overwrite `debug_camera.png`
    #[default]
    Fixed,
    /// One file per dump, `frame_YYYYMMDD_HHMMSS_mmm.png`
    Timestamped,
}

/// Default directory for debug images (platform data dir)
pub fn default_debug_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(debug_dump::DATA_SUBDIR)
}

/// PNG writer for pixel buffers
pub struct DebugImageDump {
    dir: PathBuf,
    naming: DumpNaming,
    store: Arc<dyn FileStore>,
}

impl DebugImageDump {
    /// Dump into `dir` on the local filesystem
    pub fn new(dir: impl Into<PathBuf>, naming: DumpNaming) -> Self {
        Self::with_store(dir, naming, Arc::new(FsStore))
    }

    pub fn with_store(
        dir: impl Into<PathBuf>,
        naming: DumpNaming,
        store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            dir: dir.into(),
            naming,
            store,
        }
    }

    /// Path the next dump will be written to
    pub fn next_path(&self) -> PathBuf {
        match self.naming {
            DumpNaming::Fixed => self.dir.join(debug_dump::FILE_NAME),
            DumpNaming::Timestamped => {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
                self.dir
                    .join(format!("{}_{}.png", debug_dump::TIMESTAMP_PREFIX, timestamp))
            }
        }
    }

    /// Encode a buffer as PNG and store it
    pub fn dump(&self, buffer: &PixelBuffer) -> ScanResult<PathBuf> {
        let start = std::time::Instant::now();
        let png = buffer.encode_png()?;
        let path = self.next_path();

        self.store
            .write_file(&path, &png)
            .map_err(|source| ScanError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(
            bytes = png.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Debug image encoded"
        );
        info!(path = %path.display(), "Image saved");
        Ok(path)
    }
}
