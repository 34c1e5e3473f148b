//! Token cache persistence.

use crate::credentials::Credentials;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tabdump_core::{ExportError, Result};
use tracing::debug;

/// Where credentials are cached between runs.
pub trait CredentialStore: Send + Sync {
    /// Load cached credentials, or `None` if nothing is cached.
    fn load(&self) -> Result<Option<Credentials>>;

    /// Persist credentials, replacing anything cached before.
    fn save(&self, credentials: &Credentials) -> Result<()>;
}

/// JSON token cache on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached token");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let creds = serde_json::from_str(&content).map_err(|e| {
            ExportError::auth(format!(
                "Failed to read token cache {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(creds))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, json)?;
        restrict_permissions(&self.path)?;

        debug!(path = %self.path.display(), "saved token cache");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// In-process cache; nothing survives the run.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `credentials`.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        let guard = self
            .credentials
            .lock()
            .map_err(|_| ExportError::auth("credential store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let mut guard = self
            .credentials
            .lock()
            .map_err(|_| ExportError::auth("credential store lock poisoned"))?;
        *guard = Some(credentials.clone());
        Ok(())
    }
}
