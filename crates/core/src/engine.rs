//! Round state machine: selection, match resolution and completion.

use std::{collections::BTreeSet, fmt, time::Duration};

use rand::{rngs::StdRng, SeedableRng};
use tokio::{runtime::Handle, sync::mpsc::UnboundedSender};
use tracing::{debug, info};

use crate::{
    clock::RoundClock,
    deck::{new_deal, CardId, Deck, PAIR_COUNT},
    schedule::ScheduledTask,
};

/// Default pause during which a two-card selection stays face up.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(800);
/// Default clock refresh period.
pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

/// Tunables for a [`MatchEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Delay before a two-card selection is cleared, identical for match and mismatch.
    pub reveal_delay: Duration,
    /// Period of [`RoundEvent::Tick`] while the clock runs.
    pub tick: Duration,
    /// Fixed shuffle seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reveal_delay: DEFAULT_REVEAL_DELAY,
            tick: DEFAULT_TICK,
            seed: None,
        }
    }
}

/// Identifies one round; bumps on every start so stale callbacks can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RoundId(u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round-{}", self.0)
    }
}

/// Lifecycle of the engine's current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    /// No round dealt, or the last one was torn down.
    Idle,
    /// Accepting selections.
    Running,
    /// Every pair solved; the elapsed time is frozen.
    Complete,
}

/// Timed callbacks delivered back to the loop that owns the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// Clock refresh for a running round.
    Tick {
        /// Round the ticker belongs to.
        round: RoundId,
    },
    /// The reveal delay for the current two-card selection elapsed.
    RevealElapsed {
        /// Round that scheduled the delay.
        round: RoundId,
    },
}

/// Why a selection was ignored. Rejections never change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The round is not running.
    NotRunning,
    /// Two cards are already face up awaiting the reveal delay.
    SelectionFull,
    /// The card is already part of the selection.
    AlreadySelected,
    /// The card's pair has already been solved.
    AlreadyMatched,
    /// No such card in the current deal.
    UnknownCard,
}

/// Final outcome of a completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResult {
    /// Round that produced the result.
    pub round: RoundId,
    /// Frozen elapsed time.
    pub elapsed: Duration,
}

/// Result of [`MatchEngine::select_card`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Ignored without any state change.
    Rejected(RejectReason),
    /// First card of a selection turned face up.
    Revealed,
    /// Second card completed a pair.
    Matched {
        /// Key of the solved pair.
        pair_key: &'static str,
        /// Set when this match solved the last pair.
        completed: Option<RoundResult>,
    },
    /// Second card did not pair with the first.
    Mismatched,
}

/// State machine for one player's rounds.
///
/// Owns the deal, the face-up selection, the solved pairs, the round clock and
/// every timer scheduled on behalf of the current round. All mutation happens
/// through `&mut self`, so the owner's event loop serialises user input and
/// timer events.
pub struct MatchEngine {
    config: EngineConfig,
    runtime: Handle,
    rng: StdRng,
    events: UnboundedSender<RoundEvent>,
    round: RoundId,
    status: RoundStatus,
    deck: Deck,
    selection: Vec<CardId>,
    matched: BTreeSet<&'static str>,
    clock: RoundClock,
    ticker: Option<ScheduledTask>,
    pending_reveal: Option<ScheduledTask>,
    result: Option<RoundResult>,
}

impl MatchEngine {
    /// Create an idle engine posting timer events to `events`.
    ///
    /// Timers are spawned on `runtime`, so the engine may be driven from any
    /// thread.
    pub fn new(
        config: EngineConfig,
        events: UnboundedSender<RoundEvent>,
        runtime: Handle,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            runtime,
            rng,
            events,
            round: RoundId::default(),
            status: RoundStatus::Idle,
            deck: Deck::default(),
            selection: Vec::with_capacity(2),
            matched: BTreeSet::new(),
            clock: RoundClock::new(),
            ticker: None,
            pending_reveal: None,
            result: None,
        }
    }

    /// Deal a new round and start its clock, discarding any round in progress.
    pub fn start(&mut self) -> RoundId {
        self.cancel_timers();
        self.round = RoundId(self.round.0 + 1);
        self.deck = new_deal(&mut self.rng);
        self.selection.clear();
        self.matched.clear();
        self.result = None;

        self.clock.reset();
        self.clock.start();
        let round = self.round;
        self.ticker = Some(ScheduledTask::every(
            &self.runtime,
            self.config.tick,
            self.events.clone(),
            move || RoundEvent::Tick { round },
        ));
        self.status = RoundStatus::Running;
        info!(%round, "round started");
        round
    }

    /// Replay after completion; identical to [`MatchEngine::start`].
    pub fn restart(&mut self) -> RoundId {
        self.start()
    }

    /// Abandon the current round, cancelling its timers and stopping the clock.
    pub fn teardown(&mut self) {
        self.cancel_timers();
        self.clock.stop();
        self.selection.clear();
        if self.status == RoundStatus::Running {
            debug!(round = %self.round, "round abandoned");
        }
        self.status = RoundStatus::Idle;
    }

    /// Turn a card face up, resolving the pair when it is the second pick.
    pub fn select_card(&mut self, id: CardId) -> SelectOutcome {
        let outcome = self.try_select(id);
        debug!(round = %self.round, card = %id, ?outcome, "card selected");
        outcome
    }

    fn try_select(&mut self, id: CardId) -> SelectOutcome {
        if self.status != RoundStatus::Running {
            return SelectOutcome::Rejected(RejectReason::NotRunning);
        }
        if self.selection.len() >= 2 {
            return SelectOutcome::Rejected(RejectReason::SelectionFull);
        }
        let Some(card) = self.deck.get(id) else {
            return SelectOutcome::Rejected(RejectReason::UnknownCard);
        };
        if self.selection.contains(&id) {
            return SelectOutcome::Rejected(RejectReason::AlreadySelected);
        }
        if self.matched.contains(card.pair_key) {
            return SelectOutcome::Rejected(RejectReason::AlreadyMatched);
        }

        let second = card.clone();
        let first = self
            .selection
            .first()
            .and_then(|first| self.deck.get(*first))
            .cloned();
        self.selection.push(id);
        let Some(first) = first else {
            return SelectOutcome::Revealed;
        };

        // Both outcomes clear after the same delay.
        self.pending_reveal = Some(ScheduledTask::after(
            &self.runtime,
            self.config.reveal_delay,
            self.events.clone(),
            RoundEvent::RevealElapsed { round: self.round },
        ));

        if first.pairs_with(&second) {
            self.matched.insert(second.pair_key);
            SelectOutcome::Matched {
                pair_key: second.pair_key,
                completed: self.check_completion(),
            }
        } else {
            SelectOutcome::Mismatched
        }
    }

    fn check_completion(&mut self) -> Option<RoundResult> {
        if self.matched.len() != PAIR_COUNT {
            return None;
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        let elapsed = self.clock.stop();
        let result = RoundResult {
            round: self.round,
            elapsed,
        };
        self.status = RoundStatus::Complete;
        self.result = Some(result);
        info!(round = %self.round, elapsed_ms = elapsed.as_millis() as u64, "round complete");
        Some(result)
    }

    /// Apply a timer event. Returns `true` when the visible state changed.
    ///
    /// Events from an earlier round are ignored.
    pub fn handle_event(&mut self, event: RoundEvent) -> bool {
        match event {
            RoundEvent::Tick { round } => round == self.round && self.status == RoundStatus::Running,
            RoundEvent::RevealElapsed { round } => {
                if round != self.round || self.selection.len() != 2 {
                    debug!(%round, current = %self.round, "ignoring stale reveal");
                    return false;
                }
                self.pending_reveal = None;
                self.selection.clear();
                true
            }
        }
    }

    fn cancel_timers(&mut self) {
        if let Some(task) = self.pending_reveal.take() {
            task.cancel();
        }
        if let Some(task) = self.ticker.take() {
            task.cancel();
        }
    }

    /// Current round id.
    pub fn round(&self) -> RoundId {
        self.round
    }

    /// Current lifecycle status.
    pub fn status(&self) -> RoundStatus {
        self.status
    }

    /// The dealt layout.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Face-up, unsolved cards in pick order.
    pub fn selection(&self) -> &[CardId] {
        &self.selection
    }

    /// Keys of solved pairs.
    pub fn matched(&self) -> &BTreeSet<&'static str> {
        &self.matched
    }

    /// Whether the card belongs to a solved pair.
    pub fn is_matched(&self, id: CardId) -> bool {
        self.deck
            .get(id)
            .map(|card| self.matched.contains(card.pair_key))
            .unwrap_or(false)
    }

    /// Whether the card should be drawn face up.
    pub fn is_face_up(&self, id: CardId) -> bool {
        self.selection.contains(&id) || self.is_matched(id)
    }

    /// Live or frozen elapsed time of the current round.
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Result of the current round once complete.
    pub fn result(&self) -> Option<RoundResult> {
        self.result
    }
}
