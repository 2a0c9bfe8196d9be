#![warn(clippy::all, missing_docs)]

//! Core game logic for memo, a pairs-matching memory game.
//!
//! This crate hosts the card catalog, the round state machine with its
//! clock and timers, result reporting against the account backend, and the
//! configuration used by the terminal UI and any future frontends.

pub mod cache;
pub mod clock;
pub mod config;
pub mod deck;
pub mod engine;
pub mod format;
pub mod gateway;
pub mod leaderboard;
pub mod schedule;
pub mod score;
pub mod session;

pub use cache::{JsonFileStore, LocalStore, MemoryStore, ResultCache};
pub use clock::RoundClock;
pub use config::AppConfig;
pub use deck::{new_deal, Card, CardId, CardKind, Deck, CARD_COUNT, PAIR_COUNT};
pub use engine::{
    EngineConfig, MatchEngine, RejectReason, RoundEvent, RoundId, RoundResult, RoundStatus,
    SelectOutcome,
};
pub use gateway::{FileGateway, Gateway, GatewayError, MemoryGateway, UserProfile};
pub use leaderboard::{fetch_leaderboard, LeaderboardEntry};
pub use score::{ReportWarning, ScoreReport, ScoreReporter};
pub use session::{Session, UserId};
