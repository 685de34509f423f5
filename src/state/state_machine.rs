use thiserror::Error;

/// Phases the quiz can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Waiting for the moderator to register the teams.
    Starting,
    /// The selecting team picks the next question on the board.
    SelectingQuestion,
    /// The host reads the current question; buzzers are not accepted yet.
    ReadingQuestion,
    /// The reading window is open and buzzers are accepted.
    AnsweringQuestion,
    /// A team buzzed in and is giving its answer.
    TeamSelected,
    /// Members of the winning team vote to split or steal the prize.
    SplitOrSteal,
    /// Final scoreboard. Terminal.
    Over,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Moderator registered the team rosters.
    TeamsSet,
    /// A question was picked from the board.
    QuestionSelected,
    /// Moderator opened the buzz window (or the split-or-steal vote).
    AnsweringStarted,
    /// The arbiter admitted a buzz.
    BuzzAdmitted,
    /// The answering team was wrong and other teams may still buzz.
    AnswerRejected,
    /// The current question is done (answered, skipped or exhausted).
    QuestionClosed,
    /// All regular questions are answered and the leaders are tied.
    TieBreakStarted,
    /// The winning team has several members and must split or steal.
    SplitOrStealStarted,
    /// The game ends without a split-or-steal round.
    Finish,
    /// Moderator revealed the split-or-steal votes.
    SplitOrStealRevealed,
    /// Administrative override forcing a phase.
    Override(GamePhase),
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The machine moved on since the plan was computed.
    #[error("stale plan (expected version {expected}, got {actual})")]
    VersionMismatch {
        /// Version the plan was computed against.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Phase the state machine is currently in.
    pub from: GamePhase,
    /// Phase the state machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version the plan was computed against.
    pub version: usize,
}

/// State machine implementing the quiz flow.
///
/// Commands first [`plan`](Self::plan) their transition, which only reads the
/// machine, then mutate the rest of the engine and finally [`apply`](Self::apply)
/// the plan. A rejected plan therefore leaves everything untouched.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Starting,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the starting state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a machine from persisted values.
    pub fn restore(phase: GamePhase, version: usize) -> Self {
        Self { phase, version }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Validate that `event` can be applied from the current phase.
    pub fn plan(&self, event: GameEvent) -> Result<Plan, InvalidTransition> {
        let to = self.compute_transition(&event)?;
        Ok(Plan {
            from: self.phase,
            to,
            event,
            version: self.version,
        })
    }

    /// Apply a previously computed plan, returning the new phase.
    pub fn apply(&mut self, plan: Plan) -> Result<GamePhase, ApplyError> {
        if plan.version != self.version {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version,
                actual: self.version,
            });
        }

        self.phase = plan.to;
        self.version += 1;
        Ok(self.phase)
    }

    /// Plan and apply in one step.
    pub fn transition(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let plan = self.plan(event)?;
        self.phase = plan.to;
        self.version += 1;
        Ok(self.phase)
    }

    fn compute_transition(&self, event: &GameEvent) -> Result<GamePhase, InvalidTransition> {
        use GamePhase::*;

        let next = match (self.phase, event) {
            (Starting, GameEvent::TeamsSet) => SelectingQuestion,
            (SelectingQuestion, GameEvent::QuestionSelected) => ReadingQuestion,
            (ReadingQuestion | AnsweringQuestion, GameEvent::AnsweringStarted) => {
                AnsweringQuestion
            }
            (SplitOrSteal, GameEvent::AnsweringStarted) => SplitOrSteal,
            (AnsweringQuestion, GameEvent::BuzzAdmitted) => TeamSelected,
            (TeamSelected, GameEvent::AnswerRejected) => ReadingQuestion,
            (ReadingQuestion | AnsweringQuestion | TeamSelected, GameEvent::QuestionClosed) => {
                SelectingQuestion
            }
            (SelectingQuestion, GameEvent::TieBreakStarted) => ReadingQuestion,
            (SelectingQuestion, GameEvent::SplitOrStealStarted) => SplitOrSteal,
            (SelectingQuestion, GameEvent::Finish) => Over,
            (SplitOrSteal, GameEvent::SplitOrStealRevealed) => Over,
            (from, GameEvent::Override(target)) if from != Over => *target,
            (from, event) => {
                return Err(InvalidTransition {
                    from,
                    event: event.clone(),
                });
            }
        };

        Ok(next)
    }
}
