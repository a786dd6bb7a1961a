use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::SessionState;
use crate::error::{ProposalError, Result};

/// A proposal-drafting session: an identifier plus its flat key/value
/// state. Persisted after every mutating action and reloaded at start.
#[derive(Debug, Clone)]
pub struct ProposalSession {
    pub id: String,
    pub state: SessionState,
}

impl ProposalSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: SessionState::new(),
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: SessionState::new(),
        }
    }

    /// Rehydrate a session from a persisted flat snapshot. Transient
    /// control keys in the snapshot are ignored; missing defaults are
    /// filled in afterwards so stored values always win.
    pub fn from_snapshot(id: impl Into<String>, snapshot: &Map<String, Value>) -> Self {
        let state = SessionState::empty();
        state.load_from(snapshot);
        state.ensure_defaults();
        Self {
            id: id.into(),
            state,
        }
    }
}

impl Default for ProposalSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Durable backing for sessions. Failures are reported as
/// [`ProposalError::Persistence`] and are non-fatal to the in-memory
/// session.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: &ProposalSession) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<ProposalSession>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation. Sessions share state with their stored copy
/// (the state map is reference-counted), which is what tests and the
/// storage fallback want.
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, ProposalSession>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: &ProposalSession) -> Result<()> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ProposalSession>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

/// One flat JSON document per session id under a directory.
///
/// Only serializable state reaches the file (values are already JSON);
/// transient UI-control keys are filtered on save and ignored on load.
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ProposalError::Persistence(format!(
                "invalid session id '{id}'"
            )));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn save(&self, session: &ProposalSession) -> Result<()> {
        let path = self.session_path(&session.id)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ProposalError::Persistence(e.to_string()))?;

        let snapshot = Value::Object(session.state.snapshot());
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| ProposalError::Persistence(e.to_string()))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ProposalError::Persistence(e.to_string()))?;

        debug!(session_id = %session.id, path = %path.display(), "session persisted");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ProposalSession>> {
        let path = self.session_path(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ProposalError::Persistence(e.to_string())),
        };

        let snapshot: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ProposalError::Persistence(format!("corrupt session file: {e}")))?;
        let map = snapshot.as_object().ok_or_else(|| {
            ProposalError::Persistence("session file is not a flat key/value document".to_string())
        })?;

        info!(session_id = %id, "session reloaded from disk");
        Ok(Some(ProposalSession::from_snapshot(id, map)))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.session_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProposalError::Persistence(e.to_string())),
        }
    }
}
