//! Account and best-score backend.
//!
//! The [`Gateway`] trait is the only way the core talks to account storage.
//! Two implementations ship with the crate:
//!
//! - [`FileGateway`]: a JSON document collection on local disk.
//! - [`MemoryGateway`]: process-local storage with failure injection.

mod file;
mod memory;

pub use file::FileGateway;
pub use memory::MemoryGateway;

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::session::UserId;

/// Stored account data the game reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Display name, if one has been recorded.
    pub username: Option<String>,
    /// Fastest completed round.
    pub best_score: Option<Duration>,
    /// When the best score was recorded.
    pub achieved_at: Option<DateTime<Utc>>,
}

/// One account's entry in an unordered score listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    /// Account identifier.
    pub user_id: UserId,
    /// Display name, if known.
    pub username: Option<String>,
    /// Best time, absent for accounts that never finished a round.
    pub best_score: Option<Duration>,
}

/// Backend failures. None of them is fatal to a round.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Backend refused or could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// Reading or writing the document store failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// Document store location.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The document store holds malformed data.
    #[error("failed to parse {}: {source}", path.display())]
    Serialization {
        /// Document store location.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Authentication, per-user best scores and score listings.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Mark `user` as signed in, creating its account with `username` when absent.
    async fn sign_in(&self, user: &UserId, username: &str) -> Result<(), GatewayError>;

    /// Clear the signed-in account.
    async fn sign_out(&self) -> Result<(), GatewayError>;

    /// Account currently signed in, if any.
    async fn current_user(&self) -> Result<Option<UserId>, GatewayError>;

    /// Stored profile of `user`, `None` when the account does not exist.
    async fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, GatewayError>;

    /// Best recorded time of `user`.
    async fn best_score(&self, user: &UserId) -> Result<Option<Duration>, GatewayError> {
        Ok(self
            .profile(user)
            .await?
            .and_then(|profile| profile.best_score))
    }

    /// Upsert the best time and display name, leaving other fields untouched.
    ///
    /// Does not compare against the stored value; callers enforce monotonicity.
    async fn set_best_score(
        &self,
        user: &UserId,
        best: Duration,
        display_name: &str,
    ) -> Result<(), GatewayError>;

    /// Every account with its best time, in no particular order.
    async fn list_scores(&self) -> Result<Vec<ScoreEntry>, GatewayError>;
}
