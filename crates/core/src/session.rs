//! Signed-in player context and login flow.
//!
//! A [`Session`] is passed explicitly to whatever needs the player's identity;
//! nothing in the core reaches for an ambient "current user".

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::gateway::{Gateway, GatewayError};

/// Fallback identifier for an empty username.
const FALLBACK_USER_ID: &str = "player";

/// Stable identifier of an account in the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an identifier verbatim.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive an identifier from a username.
    ///
    /// Letters and digits of any script are kept in lowercase, as are `-` and
    /// `_`. Every other character is percent-encoded byte by byte, so two names
    /// share an account only when they differ in letter case alone.
    pub fn from_username(username: &str) -> Self {
        let mut result = String::with_capacity(username.len());
        for ch in username.chars() {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_') {
                result.extend(ch.to_lowercase());
            } else {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    result.push_str(&format!("%{byte:02X}"));
                }
            }
        }
        if result.is_empty() {
            Self(FALLBACK_USER_ID.to_string())
        } else {
            Self(result)
        }
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the signed-in player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Account identifier.
    pub user_id: UserId,
    /// Name the player signed in with.
    pub username: String,
}

/// Failures while signing in.
#[derive(Debug, Error)]
pub enum LoginError {
    /// Blank or whitespace-only username.
    #[error("username must not be empty")]
    EmptyUsername,
    /// The account backend could not be reached.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Sign in with a username, creating the account on first use.
pub async fn login(gateway: &dyn Gateway, username: &str) -> Result<Session, LoginError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LoginError::EmptyUsername);
    }
    let user_id = UserId::from_username(username);
    gateway.sign_in(&user_id, username).await?;
    info!(user = %user_id, "signed in");
    Ok(Session {
        user_id,
        username: username.to_string(),
    })
}

/// Rebuild the session of a player who is still signed in, if any.
pub async fn restore(gateway: &dyn Gateway) -> Result<Option<Session>, GatewayError> {
    let Some(user_id) = gateway.current_user().await? else {
        return Ok(None);
    };
    let username = gateway
        .profile(&user_id)
        .await?
        .and_then(|profile| profile.username)
        .unwrap_or_else(|| user_id.to_string());
    Ok(Some(Session { user_id, username }))
}

/// End a session.
pub async fn logout(gateway: &dyn Gateway, session: Session) -> Result<(), GatewayError> {
    gateway.sign_out().await?;
    info!(user = %session.user_id, "signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;

    #[test]
    fn user_id_keeps_letters_and_encodes_the_rest() {
        assert_eq!(UserId::from_username("Ana Kovač_1!").as_str(), "ana%20kovač_1%21");
        assert_eq!(UserId::from_username("??").as_str(), "%3F%3F");
        assert_eq!(UserId::from_username("50%").as_str(), "50%25");
        assert_eq!(UserId::from_username("").as_str(), FALLBACK_USER_ID);
    }

    #[test]
    fn accented_and_cyrillic_names_stay_distinct() {
        let ana = UserId::from_username("Ana");
        let zana = UserId::from_username("Žana");
        assert_eq!(ana.as_str(), "ana");
        assert_eq!(zana.as_str(), "žana");
        assert_ne!(ana, zana);

        let djordje = UserId::from_username("Ђорђе");
        let ljilja = UserId::from_username("Љиља");
        assert_eq!(djordje.as_str(), "ђорђе");
        assert_ne!(djordje, ljilja);
        assert_ne!(djordje.as_str(), FALLBACK_USER_ID);

        assert_eq!(UserId::from_username("ANA"), ana);
    }

    #[tokio::test]
    async fn similar_names_sign_into_separate_accounts() {
        let gateway = MemoryGateway::new();
        let ana = login(&gateway, "Ana").await.expect("login");
        let zana = login(&gateway, "Žana").await.expect("login");
        assert_ne!(ana.user_id, zana.user_id);

        for (session, name) in [(&ana, "Ana"), (&zana, "Žana")] {
            let profile = gateway
                .profile(&session.user_id)
                .await
                .expect("profile")
                .expect("created");
            assert_eq!(profile.username.as_deref(), Some(name));
        }
    }

    #[tokio::test]
    async fn login_trims_and_registers() {
        let gateway = MemoryGateway::new();
        let session = login(&gateway, "  Marta ").await.expect("login");
        assert_eq!(session.username, "Marta");
        assert_eq!(session.user_id.as_str(), "marta");
        assert_eq!(
            gateway.current_user().await.expect("current"),
            Some(session.user_id.clone())
        );
        let profile = gateway
            .profile(&session.user_id)
            .await
            .expect("profile")
            .expect("created");
        assert_eq!(profile.username.as_deref(), Some("Marta"));
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let gateway = MemoryGateway::new();
        let err = login(&gateway, "   ").await.unwrap_err();
        assert!(matches!(err, LoginError::EmptyUsername));
        assert_eq!(gateway.current_user().await.expect("current"), None);
    }

    #[tokio::test]
    async fn restore_and_logout_round_trip() {
        let gateway = MemoryGateway::new();
        assert!(restore(&gateway).await.expect("restore").is_none());

        let session = login(&gateway, "Ivo").await.expect("login");
        let restored = restore(&gateway).await.expect("restore");
        assert_eq!(restored, Some(session.clone()));

        logout(&gateway, session).await.expect("logout");
        assert!(restore(&gateway).await.expect("restore").is_none());
    }

    #[tokio::test]
    async fn login_surfaces_backend_failures() {
        let gateway = MemoryGateway::new();
        gateway.fail_writes(true);
        let err = login(&gateway, "Ivo").await.unwrap_err();
        assert!(matches!(err, LoginError::Gateway(GatewayError::Unavailable(_))));
    }
}
