//! Match engine - drives a match round by round
//!
//! # Round Loop
//!
//! Each call to [`Match::run_round`] performs:
//! 1. Abort check (round boundaries only)
//! 2. `round_started` on every provider, ascending kind
//! 3. World round start: cooldowns tick, per-round compute resets
//! 4. Turns: every live robot, ascending id, through its kind's provider
//! 5. Apply the round's committed mutations (see [`RoundQueue::apply`])
//! 6. Team income
//! 7. Ledger admission
//! 8. `round_ended` on every provider, ascending kind
//! 9. Diff the world into a [`RoundDelta`]
//!
//! A lifecycle hook failure during a round is fatal: the round produces no
//! delta and the match stops once providers are told it ended. A
//! `match_ended` failure after the final round keeps that round's delta and
//! leaves the match `Failed` without a footer.
//!
//! # Determinism
//!
//! Given the same config, map and providers, every run produces identical
//! deltas. Robots are visited in id order, providers in kind order, and the
//! only randomness lives in providers seeded from the map seed.

use crate::control::{
    ControlProviderRegistry, Intent, MatchContext, ProviderFailure, TurnContext, TurnOutcome,
};
use crate::core::RoundClock;
use crate::delta::{DeltaEncoder, DeltaError, MatchFooter, MatchHeader, RoundDelta, WorldSnapshot};
use crate::ledger::{LedgerError, PriorityLedger};
use crate::models::event::{Event, EventLog, MatchEndReason};
use crate::models::map::{GameMap, MapError};
use crate::models::robot::{InertReason, RobotId, RobotKind, Team};
use crate::models::state::{WorldError, WorldState};
use crate::scheduler::config::{canonical_hash, ConfigError, MatchConfig};
use crate::scheduler::mutation::RoundQueue;
use crate::serializer::{ReplayRecord, Serializer, SerializerError};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid map: {0}")]
    Map(#[from] MapError),

    #[error(transparent)]
    Provider(#[from] ProviderFailure),

    #[error("Delta encoding failed: {0}")]
    Delta(#[from] DeltaError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("World error: {0}")]
    World(#[from] WorldError),

    #[error("Replay output failed: {0}")]
    Serializer(#[from] SerializerError),

    #[error("Match is {actual:?}, expected {expected:?}")]
    InvalidPhase {
        expected: MatchPhase,
        actual: MatchPhase,
    },

    #[error("Match aborted before round {round}")]
    Aborted { round: u32 },
}

// ============================================================================
// Phases and results
// ============================================================================

/// Where the match is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Built, `start` not yet called
    Created,
    Running,
    /// Ended normally or by abort; the footer is available
    Finished,
    /// Stopped by a fatal error
    Failed,
}

/// Where the current round is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    NotStarted,
    Running,
    Resolved,
}

/// Cooperative cancellation flag, honoured between rounds
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub delta: RoundDelta,
    /// Turns handed to a provider
    pub turns_run: usize,
    /// Turns whose logic faulted
    pub turns_faulted: usize,
    /// Robots that became inert this round
    pub newly_inert: Vec<RobotId>,
    /// Transactions admitted into this round's block
    pub transactions_admitted: usize,
}

/// A whole match held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReplay {
    pub header: MatchHeader,
    pub rounds: Vec<RoundDelta>,
    pub footer: MatchFooter,
}

// ============================================================================
// Match
// ============================================================================

/// One match between two teams on one map
pub struct Match {
    config: MatchConfig,
    config_hash: String,
    world: WorldState,
    registry: ControlProviderRegistry,
    ledger: PriorityLedger,
    encoder: DeltaEncoder,
    clock: RoundClock,
    event_log: EventLog,
    phase: MatchPhase,
    round_phase: RoundPhase,
    abort: AbortHandle,
    /// Competing teams that had robots at round 0
    starting_teams: BTreeSet<Team>,
    footer: Option<MatchFooter>,
    /// End-of-match hook failure raised after the final round resolved
    end_failure: Option<ProviderFailure>,
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("round", &self.clock.current_round())
            .field("max_rounds", &self.clock.max_rounds())
            .field("phase", &self.phase)
            .field("round_phase", &self.round_phase)
            .field("num_robots", &self.world.num_robots())
            .field("registry", &self.registry)
            .finish()
    }
}

impl Match {
    pub fn new(
        config: MatchConfig,
        map: GameMap,
        registry: ControlProviderRegistry,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        map.validate()?;
        let config_hash = canonical_hash(&(&config, &map))?;

        Ok(Self {
            world: WorldState::new(map, config.starting_resources),
            ledger: PriorityLedger::new(config.ledger.clone()),
            clock: RoundClock::new(config.max_rounds),
            config,
            config_hash,
            registry,
            encoder: DeltaEncoder::new(),
            event_log: EventLog::new(),
            phase: MatchPhase::Created,
            round_phase: RoundPhase::NotStarted,
            abort: AbortHandle::default(),
            starting_teams: BTreeSet::new(),
            footer: None,
            end_failure: None,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn ledger(&self) -> &PriorityLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &ControlProviderRegistry {
        &self.registry
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn current_round(&self) -> u32 {
        self.clock.current_round()
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn round_phase(&self) -> RoundPhase {
        self.round_phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, MatchPhase::Finished | MatchPhase::Failed)
    }

    /// Set when `match_ended` failed after the final round had resolved
    ///
    /// That round's result is still returned by [`Match::run_round`]; the
    /// match is `Failed` and has no footer.
    pub fn end_failure(&self) -> Option<&ProviderFailure> {
        self.end_failure.as_ref()
    }

    pub fn footer(&self) -> Option<&MatchFooter> {
        self.footer.as_ref()
    }

    /// Handle that can stop the match from another thread
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    fn context(&self) -> MatchContext {
        MatchContext {
            seed: self.world.map().seed,
            round: self.clock.current_round(),
            max_rounds: self.clock.max_rounds(),
        }
    }

    fn require_phase(&self, expected: MatchPhase) -> Result<(), MatchError> {
        if self.phase != expected {
            return Err(MatchError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start the match and describe round 0
    pub fn start(&mut self) -> Result<MatchHeader, MatchError> {
        self.require_phase(MatchPhase::Created)?;
        self.phase = MatchPhase::Running;

        match self.setup() {
            Ok(header) => Ok(header),
            Err(err) => {
                self.release(&err);
                Err(err)
            }
        }
    }

    fn setup(&mut self) -> Result<MatchHeader, MatchError> {
        let ctx = self.context();
        self.registry.match_started(&ctx)?;

        let bodies = self.world.map().bodies.clone();
        for body in bodies {
            let id = self.world.spawn_robot(body.kind, body.team, body.location)?;
            self.on_spawned(0, id);
        }

        self.starting_teams = Team::COMPETING
            .into_iter()
            .filter(|team| self.world.team_has_robots(*team))
            .collect();

        let header =
            self.encoder
                .encode_initial(&self.world, &self.config_hash, self.config.max_rounds)?;

        self.event_log.log(Event::MatchStarted {
            seed: ctx.seed,
            num_robots: self.world.num_robots(),
        });
        info!(
            seed = ctx.seed,
            max_rounds = ctx.max_rounds,
            robots = self.world.num_robots(),
            "match started"
        );
        Ok(header)
    }

    /// Tell a provider about a new robot, or mark it unmanaged
    fn on_spawned(&mut self, round: u32, id: RobotId) {
        let Some(robot) = self.world.robot(id) else {
            return;
        };
        self.event_log.log(Event::RobotSpawned {
            round,
            robot: id,
            kind: robot.kind(),
            team: robot.team(),
            location: robot.location(),
        });

        let ctx = self.context();
        if self.registry.is_registered(robot.kind()) {
            self.registry.robot_spawned(&ctx, robot);
        } else {
            self.make_inert(round, id, InertReason::Unmanaged);
        }
    }

    fn make_inert(&mut self, round: u32, id: RobotId, reason: InertReason) {
        if let Some(robot) = self.world.robot_mut(id) {
            if robot.is_inert() {
                return;
            }
            robot.make_inert(reason.clone());
            self.event_log.log(Event::RobotInert {
                round,
                robot: id,
                reason,
            });
        }
    }

    /// Play the next round
    pub fn run_round(&mut self) -> Result<RoundResult, MatchError> {
        self.require_phase(MatchPhase::Running)?;

        // STEP 1: ABORT CHECK
        if self.abort.is_aborted() {
            let round = self.clock.next_round();
            self.finish(MatchEndReason::Aborted)?;
            return Err(MatchError::Aborted { round });
        }

        let round = self.clock.advance_round();
        self.round_phase = RoundPhase::Running;

        match self.play_round(round) {
            Ok(result) => {
                self.round_phase = RoundPhase::Resolved;
                let ended = if self.clock.is_exhausted() {
                    Some(MatchEndReason::RoundLimit)
                } else if self.eliminated() {
                    Some(MatchEndReason::Elimination)
                } else {
                    None
                };
                if let Some(reason) = ended {
                    // The round itself resolved, so its delta stands
                    if let Err(failure) = self.finish(reason) {
                        warn!(round, %failure, "match_ended failed after the final round");
                        self.end_failure = Some(failure);
                    }
                }
                Ok(result)
            }
            Err(err) => {
                self.release(&err);
                Err(err)
            }
        }
    }

    fn play_round(&mut self, round: u32) -> Result<RoundResult, MatchError> {
        let ctx = self.context();

        // STEP 2: PROVIDERS ROUND START
        self.registry.round_started(&ctx)?;

        // STEP 3: WORLD ROUND START
        self.world.begin_round();
        let before = WorldSnapshot::capture(&self.world);

        // STEP 4: TURNS
        let mut queue = RoundQueue::new();
        let mut turns_run = 0;
        let mut turns_faulted = 0;
        let mut newly_inert = Vec::new();

        for id in self.world.live_robot_ids() {
            let Some(robot) = self.world.robot(id) else {
                continue;
            };
            let kind = robot.kind();
            if robot.is_inert() || !self.registry.is_registered(kind) {
                continue;
            }
            let budget = self.config.compute_budget(kind);

            let (outcome, intents) = {
                let mut turn =
                    TurnContext::new(&self.world, &self.ledger, &queue, id, ctx, budget)?;
                let outcome = self.registry.run_robot(&mut turn);
                (outcome, turn.into_intents())
            };
            let Some(outcome) = outcome else {
                continue;
            };
            turns_run += 1;

            let used = self.registry.compute_used(kind, id);
            if let Some(robot) = self.world.robot_mut(id) {
                robot.record_compute(used);
            }

            let inert_reason = match &outcome {
                TurnOutcome::Faulted { reason } => {
                    turns_faulted += 1;
                    self.event_log.log(Event::TurnFaulted {
                        round,
                        robot: id,
                        kind,
                        reason: reason.clone(),
                    });
                    Some(InertReason::Terminated)
                }
                TurnOutcome::Completed if used > budget => Some(InertReason::OverBudget {
                    used,
                    budget,
                }),
                TurnOutcome::Completed if self.registry.has_terminated(kind, id) => {
                    Some(InertReason::Terminated)
                }
                TurnOutcome::Completed => None,
            };

            match inert_reason {
                Some(reason) => {
                    self.make_inert(round, id, reason);
                    newly_inert.push(id);
                }
                None => {
                    for intent in &intents.intents {
                        if let Intent::Submit { transaction } = intent {
                            self.event_log.log(Event::TransactionSubmitted {
                                round,
                                robot: id,
                                team: intents.team,
                                cost: transaction.cost(),
                            });
                        }
                    }
                    if !intents.is_empty() {
                        queue.commit(intents);
                    }
                }
            }
        }

        // STEP 5: APPLY MUTATIONS
        let applied = queue.apply(&mut self.world);

        for (robot, cause) in &applied.deaths {
            self.registry.robot_killed(&ctx, robot);
            self.event_log.log(Event::RobotDied {
                round,
                robot: robot.id(),
                kind: robot.kind(),
                team: robot.team(),
                cause: *cause,
            });
        }
        for id in &applied.spawned {
            self.on_spawned(round, *id);
        }

        // STEP 6: INCOME
        if self.config.resource_income > 0 {
            for team in Team::COMPETING {
                if let Some(info) = self.world.team_info_mut(team) {
                    info.resources = info.resources.saturating_add(self.config.resource_income);
                }
            }
        }

        // STEP 7: LEDGER ADMISSION
        for (_, team, transaction) in applied.transactions {
            self.ledger.submit(team, transaction, round);
        }
        let admission = self.ledger.admit(round)?;
        if !admission.evicted.is_empty() {
            self.event_log.log(Event::TransactionsEvicted {
                round,
                count: admission.evicted.len(),
            });
        }
        self.event_log.log(Event::BlockAdmitted {
            round,
            admitted: admission.admitted,
            total_cost: admission.total_cost,
            still_pending: admission.skipped,
        });

        // STEP 8: PROVIDERS ROUND END
        self.registry.round_ended(&ctx)?;

        // STEP 9: DELTA
        let delta = self
            .encoder
            .encode_round(round, &before, &self.world, &applied.log)?;

        Ok(RoundResult {
            delta,
            turns_run,
            turns_faulted,
            newly_inert,
            transactions_admitted: admission.admitted,
        })
    }

    /// True once a competing team that started with robots has none left
    fn eliminated(&self) -> bool {
        self.starting_teams
            .iter()
            .any(|team| !self.world.team_has_robots(*team))
    }

    /// Sole survivor, else higher score, else higher resources
    fn decide_winner(&self) -> Option<Team> {
        let alive: Vec<Team> = Team::COMPETING
            .into_iter()
            .filter(|team| self.world.team_has_robots(*team))
            .collect();
        if let [survivor] = alive.as_slice() {
            return Some(*survivor);
        }

        let a = self.world.team_info(Team::A);
        let b = self.world.team_info(Team::B);
        match (a.score, a.resources).cmp(&(b.score, b.resources)) {
            std::cmp::Ordering::Greater => Some(Team::A),
            std::cmp::Ordering::Less => Some(Team::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    fn finish(&mut self, reason: MatchEndReason) -> Result<(), ProviderFailure> {
        let ctx = self.context();
        if let Err(failure) = self.registry.match_ended(&ctx) {
            self.event_log.log(Event::ProviderFailed {
                round: ctx.round,
                kind: failure.kind,
                hook: failure.hook,
                message: failure.source.to_string(),
            });
            self.phase = MatchPhase::Failed;
            return Err(failure);
        }

        let winner = match reason {
            MatchEndReason::Aborted => None,
            _ => self.decide_winner(),
        };
        let footer = MatchFooter {
            winner,
            reason,
            rounds_played: self.encoder.last_round(),
        };
        self.event_log.log(Event::MatchEnded {
            round: ctx.round,
            winner,
            reason,
        });
        info!(round = ctx.round, ?winner, ?reason, "match ended");

        self.footer = Some(footer);
        self.phase = MatchPhase::Finished;
        Ok(())
    }

    /// Stop after a fatal error, releasing every provider
    fn release(&mut self, err: &MatchError) {
        let ctx = self.context();
        if let MatchError::Provider(failure) = err {
            self.event_log.log(Event::ProviderFailed {
                round: ctx.round,
                kind: failure.kind,
                hook: failure.hook,
                message: failure.source.to_string(),
            });
        } else {
            warn!(round = ctx.round, %err, "match stopped by error");
        }

        if self.phase == MatchPhase::Running {
            if let Err(cleanup) = self.registry.match_ended(&ctx) {
                warn!(round = ctx.round, %cleanup, "provider cleanup after failure also failed");
            }
            self.event_log.log(Event::MatchEnded {
                round: ctx.round,
                winner: None,
                reason: MatchEndReason::ProviderFailure,
            });
        }
        self.phase = MatchPhase::Failed;
    }

    fn drive(
        &mut self,
        mut sink: impl FnMut(ReplayRecord) -> Result<(), MatchError>,
    ) -> Result<MatchFooter, MatchError> {
        let header = self.start()?;
        sink(ReplayRecord::Header(header))?;

        while !self.is_finished() {
            match self.run_round() {
                Ok(result) => {
                    sink(ReplayRecord::Round(result.delta))?;
                    if let Some(failure) = &self.end_failure {
                        return Err(failure.clone().into());
                    }
                }
                Err(MatchError::Aborted { .. }) => break,
                Err(err) => return Err(err),
            }
        }

        let footer = self.footer.clone().ok_or(MatchError::InvalidPhase {
            expected: MatchPhase::Finished,
            actual: self.phase,
        })?;
        sink(ReplayRecord::Footer(footer.clone()))?;
        Ok(footer)
    }

    /// Play the whole match, streaming every record to `serializer`
    ///
    /// An abort still ends with a footer (reason `Aborted`).
    pub fn run(&mut self, serializer: &mut dyn Serializer) -> Result<MatchFooter, MatchError> {
        let result = self
            .drive(|record| Ok(serializer.write_record(&record)?))
            .and_then(|footer| {
                serializer.flush()?;
                Ok(footer)
            });
        if let Err(err) = &result {
            if self.phase == MatchPhase::Running {
                self.release(err);
            }
        }
        result
    }

    /// Play the whole match and keep every record in memory
    pub fn run_to_completion(&mut self) -> Result<MatchReplay, MatchError> {
        let mut header = None;
        let mut rounds = Vec::new();
        let footer = self.drive(|record| {
            match record {
                ReplayRecord::Header(h) => header = Some(h),
                ReplayRecord::Round(d) => rounds.push(d),
                ReplayRecord::Footer(_) => {}
            }
            Ok(())
        })?;

        let header = header.ok_or(MatchError::Delta(DeltaError::InitialNotEncoded))?;
        Ok(MatchReplay {
            header,
            rounds,
            footer,
        })
    }

    /// Compute budget for a kind under this match's config
    pub fn compute_budget(&self, kind: RobotKind) -> u64 {
        self.config.compute_budget(kind)
    }
}
