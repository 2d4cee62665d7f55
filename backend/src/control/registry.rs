//! One control provider per robot kind

use crate::control::{ControlError, ControlProvider, MatchContext, TurnContext, TurnOutcome};
use crate::models::robot::{Robot, RobotId, RobotKind};
use std::collections::BTreeMap;
use thiserror::Error;

/// A lifecycle hook failed for one provider
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{hook} failed for the {kind} provider: {source}")]
pub struct ProviderFailure {
    pub kind: RobotKind,
    pub hook: &'static str,
    #[source]
    pub source: ControlError,
}

/// Provider table keyed by kind
///
/// Lifecycle hooks fan out in kind order so that every run visits providers
/// in the same sequence.
#[derive(Default)]
pub struct ControlProviderRegistry {
    providers: BTreeMap<RobotKind, Box<dyn ControlProvider>>,
}

impl std::fmt::Debug for ControlProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlProviderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl ControlProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        kind: RobotKind,
        provider: Box<dyn ControlProvider>,
    ) -> Result<(), ControlError> {
        if self.providers.contains_key(&kind) {
            return Err(ControlError::DuplicateProvider(kind));
        }
        self.providers.insert(kind, provider);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_provider(
        mut self,
        kind: RobotKind,
        provider: impl ControlProvider + 'static,
    ) -> Result<Self, ControlError> {
        self.register(kind, Box::new(provider))?;
        Ok(self)
    }

    pub fn is_registered(&self, kind: RobotKind) -> bool {
        self.providers.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<RobotKind> {
        self.providers.keys().copied().collect()
    }

    pub fn provider(&self, kind: RobotKind) -> Option<&dyn ControlProvider> {
        self.providers.get(&kind).map(|p| p.as_ref())
    }

    fn fan_out(
        &mut self,
        hook: &'static str,
        mut call: impl FnMut(&mut dyn ControlProvider) -> Result<(), ControlError>,
    ) -> Result<(), ProviderFailure> {
        for (kind, provider) in self.providers.iter_mut() {
            call(provider.as_mut()).map_err(|source| ProviderFailure {
                kind: *kind,
                hook,
                source,
            })?;
        }
        Ok(())
    }

    pub fn match_started(&mut self, ctx: &MatchContext) -> Result<(), ProviderFailure> {
        self.fan_out("match_started", |p| p.match_started(ctx))
    }

    pub fn round_started(&mut self, ctx: &MatchContext) -> Result<(), ProviderFailure> {
        self.fan_out("round_started", |p| p.round_started(ctx))
    }

    pub fn round_ended(&mut self, ctx: &MatchContext) -> Result<(), ProviderFailure> {
        self.fan_out("round_ended", |p| p.round_ended(ctx))
    }

    /// Every provider is told the match ended, even after a failure;
    /// the first failure is returned
    pub fn match_ended(&mut self, ctx: &MatchContext) -> Result<(), ProviderFailure> {
        let mut first = None;
        for (kind, provider) in self.providers.iter_mut() {
            if let Err(source) = provider.match_ended(ctx) {
                if first.is_none() {
                    first = Some(ProviderFailure {
                        kind: *kind,
                        hook: "match_ended",
                        source,
                    });
                }
            }
        }
        match first {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    pub fn robot_spawned(&mut self, ctx: &MatchContext, robot: &Robot) {
        if let Some(provider) = self.providers.get_mut(&robot.kind()) {
            provider.robot_spawned(ctx, robot);
        }
    }

    pub fn robot_killed(&mut self, ctx: &MatchContext, robot: &Robot) {
        if let Some(provider) = self.providers.get_mut(&robot.kind()) {
            provider.robot_killed(ctx, robot);
        }
    }

    /// Route a turn to the provider for the robot's kind
    ///
    /// Returns `None` when no provider manages that kind.
    pub fn run_robot(&mut self, turn: &mut TurnContext<'_>) -> Option<TurnOutcome> {
        let provider = self.providers.get_mut(&turn.kind())?;
        Some(provider.run_robot(turn))
    }

    pub fn compute_used(&self, kind: RobotKind, robot: RobotId) -> u64 {
        self.providers
            .get(&kind)
            .map(|p| p.compute_used(robot))
            .unwrap_or(0)
    }

    pub fn has_terminated(&self, kind: RobotKind, robot: RobotId) -> bool {
        self.providers
            .get(&kind)
            .map(|p| p.has_terminated(robot))
            .unwrap_or(false)
    }
}
