use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use campus_auth::{PersistedSession, SessionStore};

/// On-disk shape. Both halves live in one file so they are written and
/// removed together.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    token: Option<String>,
    active_module: Option<String>,
}

/// Session Store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`default_session_path`].
    pub fn at_default_path() -> anyhow::Result<Self> {
        Ok(Self::new(default_session_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<Option<SessionFile>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read session file at {:?}", self.path));
            }
        };
        let file = serde_json::from_str(&text)
            .with_context(|| format!("session file at {:?} is not valid JSON", self.path))?;
        Ok(Some(file))
    }

    /// Write-then-rename keeps the pair intact if the process dies mid-write.
    /// The temp file is created owner-only (0600 on unix), so the token is
    /// never readable by other users, not even before the rename.
    fn write(&self, file: &SessionFile) -> anyhow::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        let json = serde_json::to_vec_pretty(file).context("failed to encode session file")?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp session file in {:?}", parent))?;
        tmp.write_all(&json)
            .with_context(|| format!("failed to write {:?}", tmp.path()))?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to move session file into place at {:?}", self.path))?;
        Ok(())
    }

    fn remove(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove session file at {:?}", self.path)),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<PersistedSession> {
        match self.read() {
            Ok(file) => file.and_then(|f| PersistedSession::from_parts(f.token, f.active_module)),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable session file");
                None
            }
        }
    }

    fn save(&self, session: &PersistedSession) {
        let file = SessionFile {
            token: Some(session.token.as_str().to_string()),
            active_module: Some(session.active_module.as_str().to_string()),
        };
        if let Err(e) = self.write(&file) {
            tracing::warn!(error = %format!("{e:#}"), "failed to persist session");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.remove() {
            tracing::warn!(error = %format!("{e:#}"), "failed to clear persisted session");
        }
    }
}

/// Resolve the default session file:
/// `{app_data_dir}/campus/session.json`.
pub fn default_session_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut path = base;
    path.push("campus");
    path.push("session.json");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_auth::{Module, SessionToken};

    #[test]
    fn survives_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let pair = PersistedSession::new(SessionToken::new("tok"), Module::Boarding);
        FileSessionStore::new(&path).save(&pair);
        assert_eq!(FileSessionStore::new(&path).load(), Some(pair));

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("session.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private_to_its_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::new(&path);
        store.save(&PersistedSession::new(SessionToken::new("tok"), Module::Hostel));
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_removes_both_halves() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&PersistedSession::new(SessionToken::new("tok"), Module::Hostel));
        store.clear();
        assert!(!store.path().exists());
        assert!(store.load().is_none());

        // Clearing twice is fine.
        store.clear();
    }

    #[test]
    fn corrupt_or_partial_files_load_as_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_none());

        std::fs::write(store.path(), r#"{"token":"tok","active_module":null}"#).unwrap();
        assert!(store.load().is_none());

        std::fs::write(store.path(), r#"{"token":"tok","active_module":"LIBRARY"}"#).unwrap();
        assert_eq!(store.load().map(|p| p.active_module), Some(Module::Library));
    }

    #[test]
    fn default_path_ends_in_campus_dir() {
        if let Ok(path) = default_session_path() {
            assert!(path.ends_with("campus/session.json"));
        }
    }
}
