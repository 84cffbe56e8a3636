//! The content store: original images and restoration results on disk.
//!
//! Derived outputs (restored image and faces) are cleared whenever an
//! original is (re)established or re-fetched for processing, so a client
//! polling during a new run never sees stale output next to a new original.

use std::path::{Component, Path, PathBuf};

use restora_core::content_hash::ContentHash;
use restora_core::layout::{
    face_file_name, face_ref, original_ref, parse_face_index, restored_ref, FACES_DIR,
    ORIGINAL_FILE, RESTORED_FILE,
};
use restora_core::record::ResultRecord;
use tokio::fs;
use uuid::Uuid;

use crate::codec::reencode_png;
use crate::error::{StoreError, StoreResult};
use crate::locks::{HashGuard, HashLocks};

/// An original as stored: its content hash and PNG encoding.
///
/// `guard` keeps the hash locked, so the caller can act on the freshly
/// cleared state before any other writer gets in. Drop it (or the whole
/// value) to release the hash.
#[derive(Debug)]
pub struct StoredOriginal {
    pub hash: ContentHash,
    pub png: Vec<u8>,
    pub guard: HashGuard,
}

/// Filesystem-backed content store rooted at a single directory.
pub struct ContentStore {
    root: PathBuf,
    locks: HashLocks,
}

impl ContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            locks: HashLocks::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn hash_dir(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hash.as_str())
    }

    fn original_path(&self, hash: &ContentHash) -> PathBuf {
        self.hash_dir(hash).join(ORIGINAL_FILE)
    }

    fn restored_path(&self, hash: &ContentHash) -> PathBuf {
        self.hash_dir(hash).join(RESTORED_FILE)
    }

    fn faces_dir(&self, hash: &ContentHash) -> PathBuf {
        self.hash_dir(hash).join(FACES_DIR)
    }

    /// Wait for exclusive write access to one hash directory.
    pub async fn lock(&self, hash: &ContentHash) -> HashGuard {
        self.locks.lock(hash).await
    }

    /// Store uploaded image bytes as the original for their content hash.
    ///
    /// The hash is taken over the raw upload; the stored file is the
    /// PNG re-encoding. Any previous restored output for the hash is removed.
    /// The hash stays locked until the returned value's guard is dropped.
    pub async fn put_original(&self, bytes: &[u8]) -> StoreResult<StoredOriginal> {
        let hash = ContentHash::of_bytes(bytes);
        let png = reencode_png(bytes.to_vec()).await?;

        let guard = self.lock(&hash).await;
        self.clear_derived(&hash).await?;
        fs::create_dir_all(self.hash_dir(&hash)).await?;
        write_atomic(&self.original_path(&hash), &png).await?;

        tracing::debug!(%hash, bytes = bytes.len(), "Stored original");
        Ok(StoredOriginal { hash, png, guard })
    }

    /// Load the original for `hash` in preparation for a new restoration.
    ///
    /// Clears any restored output for the hash as a side effect. On success
    /// the hash stays locked until the returned value's guard is dropped.
    pub async fn get_original(&self, hash: &ContentHash) -> StoreResult<StoredOriginal> {
        let guard = self.lock(hash).await;
        self.clear_derived(hash).await?;

        match fs::read(self.original_path(hash)).await {
            Ok(png) => Ok(StoredOriginal {
                hash: hash.clone(),
                png,
                guard,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("hash {hash}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Describe what is stored for `hash`.
    ///
    /// The record's status reflects the disk only; callers tracking jobs
    /// overlay their own via [`ResultRecord::with_tracked_status`].
    pub async fn describe(&self, hash: &ContentHash) -> StoreResult<ResultRecord> {
        if !is_file(&self.original_path(hash)).await {
            return Err(StoreError::NotFound(format!("hash {hash}")));
        }

        let has_restored = is_file(&self.restored_path(hash)).await;
        let faces = self
            .face_files(hash)
            .await?
            .iter()
            .map(|name| face_ref(name))
            .collect();

        Ok(ResultRecord {
            hash: hash.clone(),
            original: original_ref(),
            restored: has_restored.then(restored_ref),
            faces,
            status: ResultRecord::status_from_disk(has_restored),
        })
    }

    /// Persist a finished restoration for the locked hash.
    ///
    /// Replaces any previous restored output. Faces are staged in a scratch
    /// directory and renamed into place, then the restored image is renamed
    /// into place last: a reader never sees a restored image without its
    /// full set of faces.
    pub async fn write_result(
        &self,
        guard: &HashGuard,
        restored: &[u8],
        faces: &[Vec<u8>],
    ) -> StoreResult<()> {
        let hash = guard.hash();
        let dir = self.hash_dir(hash);
        fs::create_dir_all(&dir).await?;
        self.clear_derived(hash).await?;

        let staging = dir.join(format!(".{FACES_DIR}-{}", Uuid::new_v4()));
        fs::create_dir_all(&staging).await?;
        for (idx, face) in faces.iter().enumerate() {
            if let Err(e) = fs::write(staging.join(face_file_name(idx)), face).await {
                let _ = fs::remove_dir_all(&staging).await;
                return Err(e.into());
            }
        }
        promote_staged(&staging, &self.faces_dir(hash)).await?;

        write_atomic(&self.restored_path(hash), restored).await?;

        tracing::debug!(%hash, faces = faces.len(), "Stored restoration result");
        Ok(())
    }

    /// Read a file below the store root, addressed by a relative path such
    /// as `<hash>/faces/00.png`.
    pub async fn resolve_file(&self, relative: &str) -> StoreResult<Vec<u8>> {
        let root = self.root.clone();
        let key = relative.to_string();
        let path = tokio::task::spawn_blocking(move || safe_path(&root, &key))
            .await
            .map_err(|e| {
                StoreError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })??;

        if !is_file(&path).await {
            return Err(StoreError::NotFound(relative.to_string()));
        }
        Ok(fs::read(&path).await?)
    }

    /// Face crop file names for `hash`, ordered by face index.
    async fn face_files(&self, hash: &ContentHash) -> StoreResult<Vec<String>> {
        let mut entries = match fs::read_dir(self.faces_dir(hash)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut faces = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(idx) = parse_face_index(&name) {
                faces.push((idx, name));
            }
        }
        faces.sort();
        Ok(faces.into_iter().map(|(_, name)| name).collect())
    }

    /// Remove the restored image and faces for `hash`. Missing files are fine.
    async fn clear_derived(&self, hash: &ContentHash) -> StoreResult<()> {
        match fs::remove_file(self.restored_path(hash)).await {
            Ok(()) => tracing::debug!(%hash, "Cleared previous restored image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        match fs::remove_dir_all(self.faces_dir(hash)).await {
            Ok(()) => tracing::debug!(%hash, "Cleared previous faces"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Rename a staging directory into place, removing it if that fails.
async fn promote_staged(staging: &Path, target: &Path) -> StoreResult<()> {
    if let Err(e) = fs::rename(staging, target).await {
        let _ = fs::remove_dir_all(staging).await;
        return Err(e.into());
    }
    Ok(())
}

/// Write through a temporary sibling and rename, so readers only ever see
/// a complete file.
async fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp-{}", Uuid::new_v4()));

    if let Err(e) = fs::write(&tmp, data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Resolve `key` below `root`, refusing anything that could escape it.
///
/// Rejects absolute paths, `..` and `.` components, backslashes, and paths
/// whose canonical form (following symlinks) lies outside the root.
fn safe_path(root: &Path, key: &str) -> StoreResult<PathBuf> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StoreError::InvalidPath(format!(
            "path traversal not allowed: {key}"
        )));
    }

    for component in Path::new(key).components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(StoreError::InvalidPath(format!(
                "contains unsafe path component: {key}"
            )));
        }
    }

    let path = root.join(key);
    let canonical = match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let root_canonical = root.canonicalize()?;
    if !canonical.starts_with(&root_canonical) {
        return Err(StoreError::InvalidPath(format!(
            "resolved path escapes store root: {key}"
        )));
    }

    Ok(canonical)
}
