#![deny(missing_docs)]
//! Filesystem-backed implementation of layer0's StateStore trait.
//!
//! One JSON file per key, grouped in one directory per scope. Writes go
//! to a temp file in the same directory, are synced, then renamed over
//! the target, so a reader or a crash never sees half a snapshot.

use async_trait::async_trait;
use layer0::{Scope, StateError, StateStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

/// Filesystem-backed state store.
///
/// Directory layout:
/// ```text
/// root/
///   conversations/<encoded-id>/<encoded-key>.json
///   global/<encoded-key>.json
///   custom/<encoded-name>/<encoded-key>.json
/// ```
///
/// Names are percent-encoded; only ASCII letters, digits, `-`, `_`, and
/// non-leading `.` pass through. Dot-files in a scope directory are
/// in-flight temp files and are never listed.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    writes: AtomicU64,
}

impl FsStore {
    /// Create a store rooted at `root`. Directories are created lazily
    /// on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            writes: AtomicU64::new(0),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, scope: &Scope) -> PathBuf {
        match scope {
            Scope::Conversation(id) => self.root.join("conversations").join(encode(id.as_str())),
            Scope::Global => self.root.join("global"),
            Scope::Custom(name) => self.root.join("custom").join(encode(name)),
            other => {
                let name = serde_json::to_string(other).unwrap_or_default();
                self.root.join("other").join(encode(&name))
            }
        }
    }

    fn path(&self, scope: &Scope, key: &str) -> Result<PathBuf, StateError> {
        if key.is_empty() {
            return Err(StateError::WriteFailed("empty key".into()));
        }
        Ok(self.scope_dir(scope).join(format!("{}.json", encode(key))))
    }

    fn temp_path(&self, target: &Path) -> PathBuf {
        let n = self.writes.fetch_add(1, Ordering::Relaxed);
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("state");
        target.with_file_name(format!(".{name}.{}-{n}.tmp", std::process::id()))
    }
}

/// Percent-encode a name into one safe path component.
fn encode(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for (i, byte) in name.bytes().enumerate() {
        match byte {
            b'.' if i == 0 => encoded.push_str("%2E"),
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Reverse [`encode`]. `None` for anything `encode` could not produce.
fn decode(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = std::str::from_utf8(bytes.get(i + 1..i + 3)?).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn write_failed(e: std::io::Error) -> StateError {
    StateError::WriteFailed(e.to_string())
}

#[async_trait]
impl StateStore for FsStore {
    async fn read(
        &self,
        scope: &Scope,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError> {
        let path = self.path(scope, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StateError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateError::Other(Box::new(e))),
        }
    }

    async fn write(
        &self,
        scope: &Scope,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StateError> {
        let path = self.path(scope, key)?;
        let contents =
            serde_json::to_vec(&value).map_err(|e| StateError::Serialization(e.to_string()))?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;
        }

        let temp = self.temp_path(&path);
        let staged = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(&contents).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp, &path).await
        };
        if let Err(e) = staged.await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                tracing::debug!(
                    path = %temp.display(),
                    error = %cleanup,
                    "spindle.state.fs.temp_left"
                );
            }
            return Err(write_failed(e));
        }
        tracing::trace!(path = %path.display(), bytes = contents.len(), "spindle.state.fs.write");
        Ok(())
    }

    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), StateError> {
        let path = self.path(scope, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(write_failed(e)),
        }
    }

    async fn list(&self, scope: &Scope, prefix: &str) -> Result<Vec<String>, StateError> {
        let dir = self.scope_dir(scope);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StateError::Other(Box::new(e))),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StateError::Other(Box::new(e)))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            let Some(key) = name.strip_suffix(".json").and_then(decode) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
