// src/infra/session.rs — Session-scoped key/value store backed by JSON files
//
// One `<session_id>.json` per session under the sessions directory. Every
// mutation rewrites the whole file (temp file + rename). Only one session is
// active per store instance.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::infra::errors::BrandloopError;

/// Reserved slot holding the orchestrator's state string.
pub const WORKFLOW_STATE_KEY: &str = "workflow_state";
pub const METADATA_KEY: &str = "metadata";
const DEFAULT_WORKFLOW_STATE: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TaskRequest,
    TaskResponse,
    StatusUpdate,
    Error,
    Feedback,
}

/// An entry in a session's inter-agent message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    pub from_agent: String,
    pub to_agent: String,
    pub message_type: MessageType,
    pub payload: Value,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl AgentMessage {
    pub fn new(from: &str, to: &str, message_type: MessageType, payload: Value) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            from_agent: from.to_string(),
            to_agent: to.to_string(),
            message_type,
            payload,
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }
}

/// On-disk shape of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slots: Map<String, Value>,
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
}

impl SessionData {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            created_at: Utc::now(),
            updated_at: None,
            slots: seeded_slots(),
            messages: Vec::new(),
        }
    }
}

fn seeded_slots() -> Map<String, Value> {
    let mut slots = Map::new();
    slots.insert(
        WORKFLOW_STATE_KEY.to_string(),
        Value::String(DEFAULT_WORKFLOW_STATE.to_string()),
    );
    slots.insert(METADATA_KEY.to_string(), Value::Object(Map::new()));
    slots
}

/// `session_YYYYMMDD_HHMMSS`
pub fn generate_session_id() -> String {
    Utc::now().format("session_%Y%m%d_%H%M%S").to_string()
}

fn check_session_id(id: &str) -> Result<(), BrandloopError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !id.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(BrandloopError::InvalidInput(format!(
            "session id '{id}' must be non-empty ASCII letters, digits, '_', '-' or '.'"
        )))
    }
}

pub struct SessionStore {
    dir: PathBuf,
    current: Option<SessionData>,
}

impl SessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BrandloopError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, current: None })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session_id(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.session_id.as_str())
    }

    /// The active session, if any.
    pub fn current(&self) -> Option<&SessionData> {
        self.current.as_ref()
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Start a new session and persist it. Replaces the active session.
    pub fn create_session(&mut self, id: Option<&str>) -> Result<String, BrandloopError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => generate_session_id(),
        };
        check_session_id(&id)?;

        self.current = Some(SessionData::new(id.clone()));
        self.persist()?;
        tracing::debug!(session = %id, "Session created");
        Ok(id)
    }

    fn active_mut(&mut self) -> Result<&mut SessionData, BrandloopError> {
        self.current.as_mut().ok_or(BrandloopError::NoActiveSession)
    }

    /// Overwrite slot `key` with `value` and persist.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), BrandloopError> {
        let value = serde_json::to_value(value)?;
        let session = self.active_mut()?;
        session.slots.insert(key.to_string(), value);
        session.updated_at = Some(Utc::now());
        self.persist()
    }

    pub fn update(&mut self, entries: Map<String, Value>) -> Result<(), BrandloopError> {
        for (key, value) in entries {
            self.save(&key, &value)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current.as_ref().and_then(|s| s.slots.get(key))
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Typed read. A missing or null slot is `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, BrandloopError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.get(key), Some(v) if !v.is_null())
    }

    pub fn set_workflow_state(&mut self, state: &str) -> Result<(), BrandloopError> {
        self.save(WORKFLOW_STATE_KEY, state)
    }

    pub fn workflow_state(&self) -> String {
        self.get(WORKFLOW_STATE_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_WORKFLOW_STATE)
            .to_string()
    }

    pub fn append_message(&mut self, message: AgentMessage) -> Result<(), BrandloopError> {
        let session = self.active_mut()?;
        session.messages.push(message);
        session.updated_at = Some(Utc::now());
        self.persist()
    }

    /// Messages in log order, optionally filtered by sender and recipient.
    pub fn messages(&self, from: Option<&str>, to: Option<&str>) -> Vec<AgentMessage> {
        let Some(session) = &self.current else {
            return Vec::new();
        };
        session
            .messages
            .iter()
            .filter(|m| from.map_or(true, |f| m.from_agent == f))
            .filter(|m| to.map_or(true, |t| m.to_agent == t))
            .cloned()
            .collect()
    }

    /// Drop every slot and message of the active session.
    pub fn clear(&mut self) -> Result<(), BrandloopError> {
        let session = self.active_mut()?;
        let now = Utc::now();
        let mut slots = seeded_slots();
        let mut metadata = Map::new();
        metadata.insert("cleared_at".into(), Value::String(now.to_rfc3339()));
        slots.insert(METADATA_KEY.to_string(), Value::Object(metadata));
        session.slots = slots;
        session.messages.clear();
        session.updated_at = Some(now);
        self.persist()
    }

    /// Ids of every session file in the directory, sorted.
    pub fn list_sessions(&self) -> Result<Vec<String>, BrandloopError> {
        let pattern = format!(
            "{}/*.json",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| BrandloopError::Other(anyhow::anyhow!("bad session glob: {e}")))?;

        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Delete a session file. Returns whether a file existed.
    pub fn delete_session(&mut self, id: &str) -> Result<bool, BrandloopError> {
        check_session_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        if self.session_id() == Some(id) {
            self.current = None;
        }
        tracing::debug!(session = %id, "Session deleted");
        Ok(true)
    }

    /// Make a persisted session the active one. A missing file is `Ok(false)`.
    pub fn load_session(&mut self, id: &str) -> Result<bool, BrandloopError> {
        check_session_id(id)?;
        match self.read_file(id)? {
            Some(data) => {
                self.current = Some(data);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Full JSON of a session: the active one when `id` is `None`.
    pub fn export_session(&self, id: Option<&str>) -> Result<Value, BrandloopError> {
        let data = match id {
            None => self.current.clone().ok_or(BrandloopError::NoActiveSession)?,
            Some(id) if self.session_id() == Some(id) => {
                self.current.clone().ok_or(BrandloopError::NoActiveSession)?
            }
            Some(id) => {
                check_session_id(id)?;
                self.read_file(id)?
                    .ok_or_else(|| BrandloopError::SessionNotFound { id: id.to_string() })?
            }
        };
        Ok(serde_json::to_value(data)?)
    }

    fn read_file(&self, id: &str) -> Result<Option<SessionData>, BrandloopError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Rewrite the active session's file atomically.
    fn persist(&self) -> Result<(), BrandloopError> {
        let Some(session) = &self.current else {
            return Err(BrandloopError::NoActiveSession);
        };
        std::fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(session)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", session.session_id));
        let dst = self.path_for(&session.session_id);

        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        f.flush()?;
        f.sync_all()?;
        std::fs::rename(&tmp, &dst)?;

        tracing::debug!(session = %session.session_id, bytes = json.len(), "Session persisted");
        Ok(())
    }
}

/// Cloneable handle to a store shared between the orchestrator and the stages.
///
/// The lock is only taken for synchronous store calls.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<SessionStore>>,
}

impl SharedStore {
    pub fn new(store: SessionStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BrandloopError> {
        Ok(Self::new(SessionStore::open(dir)?))
    }

    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut SessionStore) -> Result<R, BrandloopError>,
    ) -> Result<R, BrandloopError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| BrandloopError::Other(anyhow::anyhow!("session store lock poisoned")))?;
        f(&mut guard)
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), BrandloopError> {
        self.with(|s| s.save(key, value))
    }

    pub fn session_id(&self) -> Option<String> {
        self.with(|s| Ok(s.session_id().map(str::to_string)))
            .ok()
            .flatten()
    }
}
