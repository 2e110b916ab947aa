//! File-backed credential store.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use tether_core::error::StoreError;
use tether_core::store::{CredentialStore, Slot};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// File name used inside the platform data directory.
pub const SESSION_FILE: &str = "session.json";

fn map_io(action: &str, path: &Path, err: io::Error) -> StoreError {
    StoreError::Unavailable {
        message: format!("{} {}: {}", action, path.display(), err),
    }
}

/// On-disk layout of the session document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    slots: BTreeMap<String, String>,
}

/// Releases the advisory lock when dropped.
struct LockGuard(File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

/// Credential store persisting all slots in one JSON document.
///
/// Writers hold an exclusive lock on a sibling `.lock` file and replace the
/// document atomically; readers hold a shared lock. Several processes can
/// therefore share one session file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by the document at `path`. Nothing is created until the
    /// first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store in the platform data directory.
    pub fn default_location() -> Result<Self, StoreError> {
        Ok(Self::new(default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the document was last written, if it exists.
    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let _lock = self.lock(false)?;
        Ok(self.read_document()?.saved_at)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| map_io("create", parent, e))?;
        }
        Ok(())
    }

    fn lock(&self, exclusive: bool) -> Result<LockGuard, StoreError> {
        self.ensure_parent()?;
        let lock_path = self.lock_path();

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| map_io("open", &lock_path, e))?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| map_io("lock", &lock_path, e))?;

        Ok(LockGuard(file))
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::default()),
            Err(e) => return Err(map_io("read", &self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Document::default());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            message: format!("{}: {}", self.path.display(), e),
        })
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let temp_path = self.temp_path();
        let json = serde_json::to_string_pretty(document).map_err(|e| StoreError::Unavailable {
            message: e.to_string(),
        })?;

        {
            let mut file = File::create(&temp_path).map_err(|e| map_io("create", &temp_path, e))?;

            #[cfg(unix)]
            {
                let mut perms = file
                    .metadata()
                    .map_err(|e| map_io("stat", &temp_path, e))?
                    .permissions();
                perms.set_mode(0o600);
                fs::set_permissions(&temp_path, perms)
                    .map_err(|e| map_io("chmod", &temp_path, e))?;
            }

            file.write_all(json.as_bytes())
                .map_err(|e| map_io("write", &temp_path, e))?;
            file.sync_all().map_err(|e| map_io("sync", &temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| map_io("rename", &self.path, e))?;
        trace!(path = %self.path.display(), "Session document written");
        Ok(())
    }

    /// Read-modify-write under the exclusive lock.
    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let _lock = self.lock(true)?;
        let mut document = self.read_document()?;
        apply(&mut document.slots);

        if document.slots.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => {
                    debug!(path = %self.path.display(), "Session file removed");
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(map_io("remove", &self.path, e)),
            };
        }

        document.saved_at = Some(Utc::now());
        self.write_document(&document)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        let _lock = self.lock(false)?;
        let mut document = self.read_document()?;
        Ok(document.slots.remove(slot.key()))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, slot: Slot, value: &str) -> Result<(), StoreError> {
        self.update(|slots| {
            slots.insert(slot.key().to_string(), value.to_string());
        })
    }

    #[instrument(skip(self, entries), fields(path = %self.path.display()))]
    fn set_many(&self, entries: &[(Slot, &str)]) -> Result<(), StoreError> {
        self.update(|slots| {
            for (slot, value) in entries {
                slots.insert(slot.key().to_string(), value.to_string());
            }
        })
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, slot: Slot) -> Result<(), StoreError> {
        self.update(|slots| {
            slots.remove(slot.key());
        })
    }
}

/// Default session file: `<data dir>/session.json` for the `tether` app.
pub fn default_path() -> Result<PathBuf, StoreError> {
    let dirs = ProjectDirs::from("", "", "tether").ok_or_else(|| StoreError::Unavailable {
        message: "Could not determine data directory".to_string(),
    })?;
    Ok(dirs.data_dir().join(SESSION_FILE))
}
