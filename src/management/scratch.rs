use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::Res;

/// Directory holding in-flight segment containers.
///
/// Every acquisition gets its own file name built from the track id and a
/// monotonic counter, so no two tracks ever write to the same scratch file.
/// The directory is emptied after each top-level URL.
pub struct ScratchDir {
    root: PathBuf,
    counter: AtomicU64,
}

impl ScratchDir {
    pub async fn create(root: PathBuf) -> Res<Self> {
        async_fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A scratch path no other call on this directory has returned.
    pub fn next_path(&self, track_id: u64) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{track_id}-{n}.mp4"))
    }

    /// Removes every file in the scratch directory.
    pub async fn cleanup(&self) -> Res<()> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                async_fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    /// Synchronous variant for the interrupt path, where the runtime is about
    /// to be torn down.
    pub fn cleanup_now(&self) {
        if let Ok(entries) = std::fs::read_dir(&self.root) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    let _ = std::fs::remove_file(path);
                }
            }
        }
    }
}
