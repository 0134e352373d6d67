// Per-request scratch directories
//
// Every request owns one UUID-named directory under the scratch root. The
// directory and everything in it is removed when the guard is dropped, which
// covers stage failure, timeout and client disconnect. On success the guard
// travels with the open output file until the response body is dropped.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Prefix of request directories, used to recognise leftovers at startup
const REQUEST_DIR_PREFIX: &str = "req-";

/// Request-owned scratch directory, deleted on drop
#[derive(Debug)]
pub struct ScratchDir {
    id: Uuid,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh directory `<root>/req-<id>`
    pub async fn create(root: &Path, id: Uuid) -> io::Result<Self> {
        let path = root.join(format!("{}{}", REQUEST_DIR_PREFIX, id));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { id, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the downloaded video track
    pub fn video_file(&self, ext: &str) -> PathBuf {
        self.path.join(format!("video.{}", ext))
    }

    /// Path of the downloaded audio track
    pub fn audio_file(&self, ext: &str) -> PathBuf {
        self.path.join(format!("audio.{}", ext))
    }

    /// Path of the muxed output
    pub fn combined_file(&self) -> PathBuf {
        self.path.join("combined.mp4")
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(request_id = %self.id, "scratch directory removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }
}

/// Open output file that keeps its scratch directory alive
#[derive(Debug)]
pub struct ScratchFile {
    file: tokio::fs::File,
    size: u64,
    dir: ScratchDir,
}

impl ScratchFile {
    /// Open `path` inside `dir`; the directory is removed if opening fails
    pub async fn open(dir: ScratchDir, path: &Path) -> io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        Ok(Self { file, size, dir })
    }

    /// File size in bytes at open time
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Split into the readable file and the guard that must outlive it
    pub fn into_parts(self) -> (tokio::fs::File, ScratchDir) {
        (self.file, self.dir)
    }
}

/// Create the scratch root and remove request directories left by a previous
/// process. Returns how many were removed.
pub fn prepare_scratch_root(root: &Path) -> io::Result<usize> {
    std::fs::create_dir_all(root)?;

    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let is_request_dir = entry.file_name().to_string_lossy().starts_with(REQUEST_DIR_PREFIX)
            && entry.file_type()?.is_dir();
        if is_request_dir {
            std::fs::remove_dir_all(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
