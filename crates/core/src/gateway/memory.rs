use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{Gateway, GatewayError, ScoreEntry, UserProfile};
use crate::session::UserId;

#[derive(Debug, Default)]
struct State {
    current_user: Option<UserId>,
    users: BTreeMap<UserId, UserProfile>,
    fail_reads: bool,
    fail_writes: bool,
    best_score_writes: usize,
}

/// Gateway keeping accounts in memory, with switches to simulate an outage.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: RwLock<State>,
}

impl MemoryGateway {
    /// Empty gateway with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with a stored best time.
    pub fn with_best(self, user: UserId, username: &str, best: Duration) -> Self {
        self.state.write().users.insert(
            user,
            UserProfile {
                username: Some(username.to_string()),
                best_score: Some(best),
                achieved_at: Some(Utc::now()),
            },
        );
        self
    }

    /// Make every read fail with [`GatewayError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.state.write().fail_reads = fail;
    }

    /// Make every write fail with [`GatewayError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.state.write().fail_writes = fail;
    }

    /// Number of successful best-score writes.
    pub fn best_score_writes(&self) -> usize {
        self.state.read().best_score_writes
    }

    fn check_read(&self) -> Result<(), GatewayError> {
        if self.state.read().fail_reads {
            return Err(GatewayError::Unavailable("read refused".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), GatewayError> {
        if self.state.read().fail_writes {
            return Err(GatewayError::Unavailable("write refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn sign_in(&self, user: &UserId, username: &str) -> Result<(), GatewayError> {
        self.check_write()?;
        let mut state = self.state.write();
        let profile = state.users.entry(user.clone()).or_default();
        if profile.username.is_none() {
            profile.username = Some(username.to_string());
        }
        state.current_user = Some(user.clone());
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.state.write().current_user = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<UserId>, GatewayError> {
        Ok(self.state.read().current_user.clone())
    }

    async fn profile(&self, user: &UserId) -> Result<Option<UserProfile>, GatewayError> {
        self.check_read()?;
        Ok(self.state.read().users.get(user).cloned())
    }

    async fn set_best_score(
        &self,
        user: &UserId,
        best: Duration,
        display_name: &str,
    ) -> Result<(), GatewayError> {
        self.check_write()?;
        let mut state = self.state.write();
        let profile = state.users.entry(user.clone()).or_default();
        profile.best_score = Some(best);
        profile.username = Some(display_name.to_string());
        profile.achieved_at = Some(Utc::now());
        state.best_score_writes += 1;
        Ok(())
    }

    async fn list_scores(&self) -> Result<Vec<ScoreEntry>, GatewayError> {
        self.check_read()?;
        Ok(self
            .state
            .read()
            .users
            .iter()
            .map(|(user_id, profile)| ScoreEntry {
                user_id: user_id.clone(),
                username: profile.username.clone(),
                best_score: profile.best_score,
            })
            .collect())
    }
}
