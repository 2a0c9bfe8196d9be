//! Post-round result reporting.
//!
//! A finished round always lands in the local cache. The gateway's best score
//! is only ever lowered: a slower or equal time never overwrites it. Backend
//! trouble is collected as warnings so the round result stays valid.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cache::{ResultCache, StoreError},
    gateway::{Gateway, GatewayError},
    session::Session,
};

/// Name recorded when neither the profile nor the session has one.
pub const UNKNOWN_PLAYER: &str = "Unknown player";

/// Non-fatal problems met while reporting a result.
#[derive(Debug, Error)]
pub enum ReportWarning {
    /// No one is signed in, so the leaderboard was not touched.
    #[error("not signed in; result kept on this device only")]
    MissingUser,
    /// Reading or writing the best score failed.
    #[error("could not save your best score to the ranking: {0}")]
    PersistenceFailure(#[source] GatewayError),
    /// The device-local cache could not be updated.
    #[error("could not store the result locally: {0}")]
    LocalCache(#[source] StoreError),
}

/// What happened to a reported result.
#[derive(Debug)]
pub struct ScoreReport {
    /// The reported time, truncated to whole milliseconds.
    pub elapsed: Duration,
    /// Best time stored before this report, when it could be read.
    pub previous_best: Option<Duration>,
    /// Whether the gateway now holds `elapsed` as the best time.
    pub new_best: bool,
    /// Problems that did not stop the report.
    pub warnings: Vec<ReportWarning>,
}

impl ScoreReport {
    fn new(elapsed: Duration) -> Self {
        Self {
            elapsed,
            previous_best: None,
            new_best: false,
            warnings: Vec::new(),
        }
    }
}

/// Hands finished rounds to the local cache and the gateway.
#[derive(Clone)]
pub struct ScoreReporter {
    gateway: Arc<dyn Gateway>,
    cache: ResultCache,
}

impl ScoreReporter {
    /// Create a reporter over the given gateway and cache.
    pub fn new(gateway: Arc<dyn Gateway>, cache: ResultCache) -> Self {
        Self { gateway, cache }
    }

    /// Record a round result for `session`.
    ///
    /// Never fails: every problem is returned in [`ScoreReport::warnings`].
    pub async fn report_result(&self, session: Option<&Session>, elapsed: Duration) -> ScoreReport {
        let elapsed = whole_millis(elapsed);
        let mut report = ScoreReport::new(elapsed);

        if let Err(err) = self.cache.record(elapsed) {
            warn!("failed to cache result: {err}");
            report.warnings.push(ReportWarning::LocalCache(err));
        }

        let Some(session) = session else {
            warn!("no signed-in user; skipping best-score update");
            report.warnings.push(ReportWarning::MissingUser);
            return report;
        };

        if let Err(err) = self.update_best(session, &mut report).await {
            warn!(user = %session.user_id, "failed to update best score: {err}");
            report.warnings.push(ReportWarning::PersistenceFailure(err));
        }
        report
    }

    async fn update_best(
        &self,
        session: &Session,
        report: &mut ScoreReport,
    ) -> Result<(), GatewayError> {
        let profile = self.gateway.profile(&session.user_id).await?;
        let previous = profile.as_ref().and_then(|profile| profile.best_score);
        report.previous_best = previous;

        if previous.is_some_and(|best| report.elapsed >= best) {
            info!(user = %session.user_id, "result is not a new best");
            return Ok(());
        }

        let display_name = profile
            .and_then(|profile| profile.username)
            .filter(|name| !name.trim().is_empty())
            .or_else(|| Some(session.username.clone()).filter(|name| !name.trim().is_empty()))
            .unwrap_or_else(|| UNKNOWN_PLAYER.to_string());
        self.gateway
            .set_best_score(&session.user_id, report.elapsed, &display_name)
            .await?;
        report.new_best = true;
        info!(
            user = %session.user_id,
            best_ms = report.elapsed.as_millis() as u64,
            "new best score saved"
        );
        Ok(())
    }
}

fn whole_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::MemoryStore,
        gateway::MemoryGateway,
        session::UserId,
    };

    fn session() -> Session {
        Session {
            user_id: UserId::new("mia"),
            username: "Mia".to_string(),
        }
    }

    fn reporter(gateway: Arc<MemoryGateway>) -> (ScoreReporter, ResultCache) {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()));
        (ScoreReporter::new(gateway, cache.clone()), cache)
    }

    #[tokio::test]
    async fn first_result_becomes_best() {
        let gateway = Arc::new(MemoryGateway::new());
        let (reporter, cache) = reporter(gateway.clone());
        let session = session();

        let report = reporter
            .report_result(Some(&session), Duration::from_millis(42_500))
            .await;
        assert!(report.new_best);
        assert!(report.warnings.is_empty());
        assert_eq!(report.previous_best, None);
        assert_eq!(
            gateway.best_score(&session.user_id).await.expect("read"),
            Some(Duration::from_millis(42_500))
        );
        let profile = gateway.profile(&session.user_id).await.expect("read").expect("profile");
        assert_eq!(profile.username.as_deref(), Some("Mia"));
        assert_eq!(cache.previous().expect("cache"), Some(Duration::from_millis(42_500)));
    }

    #[tokio::test]
    async fn slower_result_keeps_existing_best() {
        let session = session();
        let gateway = Arc::new(MemoryGateway::new().with_best(
            session.user_id.clone(),
            "Mia",
            Duration::from_secs(30),
        ));
        let (reporter, cache) = reporter(gateway.clone());

        let report = reporter
            .report_result(Some(&session), Duration::from_secs(35))
            .await;
        assert!(!report.new_best);
        assert_eq!(report.previous_best, Some(Duration::from_secs(30)));
        assert_eq!(
            gateway.best_score(&session.user_id).await.expect("read"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(gateway.best_score_writes(), 0);
        assert_eq!(cache.previous().expect("cache"), Some(Duration::from_secs(35)));
    }

    #[tokio::test]
    async fn faster_result_replaces_best() {
        let session = session();
        let gateway = Arc::new(MemoryGateway::new().with_best(
            session.user_id.clone(),
            "Mia",
            Duration::from_secs(30),
        ));
        let (reporter, _) = reporter(gateway.clone());

        let report = reporter
            .report_result(Some(&session), Duration::from_millis(29_990))
            .await;
        assert!(report.new_best);
        assert_eq!(
            gateway.best_score(&session.user_id).await.expect("read"),
            Some(Duration::from_millis(29_990))
        );
    }

    #[tokio::test]
    async fn tie_does_not_write() {
        let session = session();
        let gateway = Arc::new(MemoryGateway::new().with_best(
            session.user_id.clone(),
            "Mia",
            Duration::from_secs(30),
        ));
        let (reporter, _) = reporter(gateway.clone());

        let report = reporter
            .report_result(Some(&session), Duration::from_micros(30_000_400))
            .await;
        assert!(!report.new_best);
        assert_eq!(report.elapsed, Duration::from_secs(30));
        assert_eq!(gateway.best_score_writes(), 0);
    }

    #[tokio::test]
    async fn missing_user_still_caches_locally() {
        let gateway = Arc::new(MemoryGateway::new());
        let (reporter, cache) = reporter(gateway.clone());

        let report = reporter.report_result(None, Duration::from_secs(12)).await;
        assert!(!report.new_best);
        assert!(matches!(report.warnings.as_slice(), [ReportWarning::MissingUser]));
        assert_eq!(cache.previous().expect("cache"), Some(Duration::from_secs(12)));
        assert_eq!(cache.best().expect("cache"), Some(Duration::from_secs(12)));
        assert_eq!(gateway.best_score_writes(), 0);
    }

    #[tokio::test]
    async fn backend_failure_is_a_warning() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail_writes(true);
        let (reporter, cache) = reporter(gateway.clone());
        let session = session();

        let report = reporter
            .report_result(Some(&session), Duration::from_secs(20))
            .await;
        assert!(!report.new_best);
        assert!(matches!(
            report.warnings.as_slice(),
            [ReportWarning::PersistenceFailure(GatewayError::Unavailable(_))]
        ));
        assert_eq!(cache.previous().expect("cache"), Some(Duration::from_secs(20)));

        gateway.fail_writes(false);
        gateway.fail_reads(true);
        let report = reporter
            .report_result(Some(&session), Duration::from_secs(19))
            .await;
        assert!(!report.new_best);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(gateway.best_score_writes(), 0);
    }

    #[tokio::test]
    async fn best_scores_are_kept_per_player() {
        let gateway = Arc::new(MemoryGateway::new());
        let (reporter, _) = reporter(gateway.clone());
        let ana = crate::session::login(gateway.as_ref(), "Ana").await.expect("login");
        let zana = crate::session::login(gateway.as_ref(), "Žana").await.expect("login");

        let first = reporter.report_result(Some(&ana), Duration::from_secs(30)).await;
        assert!(first.new_best);
        let second = reporter.report_result(Some(&zana), Duration::from_secs(50)).await;
        assert!(second.new_best);
        assert_eq!(second.previous_best, None);

        assert_eq!(
            gateway.best_score(&ana.user_id).await.expect("read"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            gateway.best_score(&zana.user_id).await.expect("read"),
            Some(Duration::from_secs(50))
        );
        let ranking = crate::leaderboard::fetch_leaderboard(gateway.as_ref())
            .await
            .expect("ranking");
        let names: Vec<_> = ranking.iter().map(|entry| entry.display_name.as_str()).collect();
        assert_eq!(names, ["Ana", "Žana"]);
    }

    #[tokio::test]
    async fn stored_name_wins_over_session_name() {
        let session = session();
        let gateway = Arc::new(MemoryGateway::new().with_best(
            session.user_id.clone(),
            "Mia K.",
            Duration::from_secs(60),
        ));
        let (reporter, _) = reporter(gateway.clone());

        reporter
            .report_result(Some(&session), Duration::from_secs(50))
            .await;
        let profile = gateway.profile(&session.user_id).await.expect("read").expect("profile");
        assert_eq!(profile.username.as_deref(), Some("Mia K."));
    }

    #[tokio::test]
    async fn unnamed_player_gets_placeholder() {
        let gateway = Arc::new(MemoryGateway::new());
        let (reporter, _) = reporter(gateway.clone());
        let session = Session {
            user_id: UserId::new("anon"),
            username: " ".to_string(),
        };

        reporter
            .report_result(Some(&session), Duration::from_secs(50))
            .await;
        let profile = gateway.profile(&session.user_id).await.expect("read").expect("profile");
        assert_eq!(profile.username.as_deref(), Some(UNKNOWN_PLAYER));
    }
}
