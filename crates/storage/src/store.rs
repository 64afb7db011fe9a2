use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::{Error, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence port for editing sessions.
///
/// Object-safe through the explicit [`BoxFuture`] return type so the editor
/// can hold an `Arc<dyn SessionStore>` without knowing the medium.
pub trait SessionStore: Send + Sync + 'static {
    fn save<'a>(&'a self, session_id: &'a str, state: Value) -> BoxFuture<'a, Result<()>>;

    fn load<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;
}

pub(crate) fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id != "."
        && session_id != ".."
        && !session_id
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control());

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidSessionId(session_id.to_string()))
    }
}

/// One pretty-printed JSON file per session under `base`.
#[derive(Debug, Clone)]
pub struct FsSessionStore {
    base: PathBuf,
}

impl FsSessionStore {
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        if !base.is_absolute() {
            return Err(Error::PathNotAbsolute);
        }
        Ok(Self { base })
    }

    /// `<data dir>/<app_folder>/sessions`.
    pub fn default_location(app_folder: &str) -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or(Error::DataDirUnavailable)?;
        Self::new(data_dir.join(app_folder).join("sessions"))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.base.join(format!("{session_id}.json")))
    }
}

impl SessionStore for FsSessionStore {
    fn save<'a>(&'a self, session_id: &'a str, state: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let path = self.session_path(session_id)?;
            let content = serde_json::to_string_pretty(&state)?;
            crate::fs::atomic_write_async(&path, &content).await?;
            tracing::debug!(session_id, path = %path.display(), "session_saved");
            Ok(())
        })
    }

    fn load<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            let path = self.session_path(session_id)?;
            match crate::fs::read_optional(&path).await? {
                Some(content) => Ok(Some(serde_json::from_str(&content)?)),
                None => Ok(None),
            }
        })
    }
}

/// In-process store, mostly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, Value>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn save<'a>(&'a self, session_id: &'a str, state: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            validate_session_id(session_id)?;
            self.sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(session_id.to_string(), state);
            *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            Ok(())
        })
    }

    fn load<'a>(&'a self, session_id: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            validate_session_id(session_id)?;
            Ok(self
                .sessions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(session_id)
                .cloned())
        })
    }
}
