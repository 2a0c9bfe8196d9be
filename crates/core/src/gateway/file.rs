use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Gateway, GatewayError, ScoreEntry, UserProfile};
use crate::session::UserId;

/// File name of the user collection inside the data directory.
pub const USERS_FILE: &str = "users.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    #[serde(default)]
    current_user: Option<UserId>,
    #[serde(default)]
    users: BTreeMap<UserId, UserDocument>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    best_score_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    achieved_at: Option<DateTime<Utc>>,
}

impl UserDocument {
    fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            best_score: self.best_score_ms.map(Duration::from_millis),
            achieved_at: self.achieved_at,
        }
    }
}

/// Gateway persisting all accounts in a single JSON document on disk.
///
/// Every operation reads the file afresh and writes through a temporary file
/// followed by a rename, so a crash never leaves a half-written collection.
pub struct FileGateway {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileGateway {
    /// Store the collection as `users.json` under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            path: root.into().join(USERS_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Location of the collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Collection, GatewayError> {
        if !self.path.exists() {
            return Ok(Collection::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| self.io(source))?;
        serde_json::from_str(&content).map_err(|source| GatewayError::Serialization {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, collection: &Collection) -> Result<(), GatewayError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io(source))?;
        }
        let serialised =
            serde_json::to_vec_pretty(collection).map_err(|source| GatewayError::Serialization {
                path: self.path.clone(),
                source,
            })?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialised).map_err(|source| self.io(source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io(source))
    }

    fn update<T>(&self, apply: impl FnOnce(&mut Collection) -> T) -> Result<T, GatewayError> {
        let _guard = self.lock.lock();
        let mut collection = self.read()?;
        let value = apply(&mut collection);
        self.write(&collection)?;
        Ok(value)
    }

    fn io(&self, source: std::io::Error) -> GatewayError {
        GatewayError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl Gateway for FileGateway {
    async fn sign_in(&self, user: &UserId, username: &str) -> Result<(), GatewayError> {
        self.update(|collection| {
            let document = collection.users.entry(user.clone()).or_default();
            if document.username.is_none() {
                document.username = Some(username.to_string());
            }
            collection.current_user = Some(user.clone());
        })
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.update(|collection| {
            collection.current_user = None;
        })
    }

    async fn current_user(&self) -> Result<Option<UserId>, GatewayError> {
        let _guard = self.lock.lock();
        Ok(self.read()?.current_user)
    }

    async fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, GatewayError> {
        let _guard = self.lock.lock();
        Ok(self.read()?.users.get(user).map(UserDocument::profile))
    }

    async fn set_best_score(
        &self,
        user: &UserId,
        best: Duration,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        self.update(|collection| {
            let document = collection.users.entry(user.clone()).or_default();
            document.best_score_ms = Some(best.as_millis() as u64);
            document.username = Some(display_name.to_string());
            document.achieved_at = Some(Utc::now());
        })?;
        debug!(user = %user, path = %self.path.display(), "best score written");
        Ok(())
    }

    async fn list_scores(&self) -> Result<Vec<ScoreEntry>, GatewayError> {
        let _guard = self.lock.lock();
        Ok(self
            .read()?
            .users
            .into_iter()
            .map(|(user_id, document)| ScoreEntry {
                user_id,
                username: document.username,
                best_score: document.best_score_ms.map(Duration::from_millis),
            })
            .collect())
    }
}
