use std::{collections::BTreeSet, sync::Arc, time::Duration};

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::{
    error::GameError,
    state::{
        CONTROLLER_COUNT,
        actions::ActionSignals,
        arbiter::{Arbitration, Button, ButtonFrame, BuzzArbiter, single_press},
        clock::Clock,
        questions::{Question, QuestionBank},
        state_machine::{GameEvent, GamePhase, GameStateMachine, Plan},
        teams::TeamRegistry,
    },
};

/// Tunables fixed for the lifetime of a game.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Whether a multi-member winner goes through split-or-steal.
    pub split_or_steal: bool,
    /// Lockout applied to a controller that buzzes before the window opens.
    pub buzz_penalty: Duration,
    /// How long the split-or-steal vote stays open.
    pub vote_window: Duration,
}

/// Light change requested by the engine, executed once the engine lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightCommand {
    pub controllers: Vec<usize>,
    pub on: bool,
}

/// What a button frame did to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// Nothing observable happened.
    NoChange,
    /// Controllers pressed outside the window and were locked out.
    Penalized(Vec<usize>),
    /// The controller takes the question.
    Admitted(usize),
    /// Split-or-steal votes recorded by this frame (`true` = steal).
    Voted(Vec<(usize, bool)>),
}

impl BuzzOutcome {
    /// Whether observers should receive a fresh snapshot.
    pub fn changes_state(&self) -> bool {
        matches!(self, BuzzOutcome::Admitted(_) | BuzzOutcome::Voted(_))
    }
}

/// Everything persisted about a game, used to rebuild an engine.
#[derive(Debug, Clone)]
pub struct GameProgress {
    pub phase: GamePhase,
    pub version: usize,
    pub questions: QuestionBank,
    pub teams: TeamRegistry,
    pub used: BTreeSet<usize>,
    pub votes: IndexMap<usize, bool>,
}

/// Orchestrates questions, teams and buzz arbitration through the game state machine.
///
/// Every command plans its transition first and only mutates once the plan and its own
/// preconditions hold, so a command returning an error leaves the game untouched.
#[derive(Debug)]
pub struct GameEngine {
    machine: GameStateMachine,
    questions: QuestionBank,
    teams: TeamRegistry,
    arbiter: BuzzArbiter,
    actions: ActionSignals,
    used: BTreeSet<usize>,
    votes: IndexMap<usize, bool>,
    settings: EngineSettings,
    clock: Arc<dyn Clock>,
    lights: Vec<LightCommand>,
}

impl GameEngine {
    pub fn new(questions: QuestionBank, settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        Self::restore(
            GameProgress {
                phase: GamePhase::Starting,
                version: 0,
                questions,
                teams: TeamRegistry::new(),
                used: BTreeSet::new(),
                votes: IndexMap::new(),
            },
            settings,
            clock,
        )
    }

    /// Rebuild an engine from saved progress. The window starts closed and no penalty runs.
    pub fn restore(progress: GameProgress, settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        let arbiter = BuzzArbiter::new(settings.buzz_penalty, clock.now());
        Self {
            machine: GameStateMachine::restore(progress.phase, progress.version),
            questions: progress.questions,
            teams: progress.teams,
            arbiter,
            actions: ActionSignals::default(),
            used: progress.used,
            votes: progress.votes,
            settings,
            clock,
            lights: Vec::new(),
        }
    }

    /// Copy of the persisted part of the game.
    pub fn progress(&self) -> GameProgress {
        GameProgress {
            phase: self.machine.phase(),
            version: self.machine.version(),
            questions: self.questions.clone(),
            teams: self.teams.clone(),
            used: self.used.clone(),
            votes: self.votes.clone(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    pub fn version(&self) -> usize {
        self.machine.version()
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        self.questions.current()
    }

    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    pub fn actions(&self) -> &ActionSignals {
        &self.actions
    }

    /// Controllers that already buzzed (or voted) on the current question.
    pub fn used(&self) -> &BTreeSet<usize> {
        &self.used
    }

    /// Split-or-steal votes in cast order (`true` = steal).
    pub fn votes(&self) -> &IndexMap<usize, bool> {
        &self.votes
    }

    pub fn arbiter(&self) -> &BuzzArbiter {
        &self.arbiter
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Drain the light changes requested since the last call.
    pub fn take_light_commands(&mut self) -> Vec<LightCommand> {
        std::mem::take(&mut self.lights)
    }

    /// Register the teams and start the game.
    pub fn set_teams(&mut self, rosters: Vec<Vec<String>>) -> Result<(), GameError> {
        let plan = self.machine.plan(GameEvent::TeamsSet)?;
        self.teams.set_teams(rosters)?;
        self.actions.clear();
        info!(teams = self.teams.teams().len(), "teams registered");
        self.commit(plan)
    }

    /// Pick a board question for the host to read.
    pub fn select_question(&mut self, id: i64) -> Result<(), GameError> {
        let plan = self.machine.plan(GameEvent::QuestionSelected)?;
        self.questions.select(id)?;
        self.actions.clear();
        debug!(question = id, "question selected");
        self.commit(plan)
    }

    /// Open the buzz window, or the split-or-steal vote.
    pub fn begin_answering(&mut self) -> Result<(), GameError> {
        let plan = self.machine.plan(GameEvent::AnsweringStarted)?;
        self.actions.clear();

        let window = if plan.from == GamePhase::SplitOrSteal {
            self.settings.vote_window
        } else {
            self.questions.current().time_to_answer
        };
        self.arbiter.arm(self.clock.now(), window);
        self.actions.play_start_accepting = true;
        let open: Vec<usize> = self.teams.playing().difference(&self.used).copied().collect();
        self.lights(open, true);
        debug!(window_ms = window.as_millis() as u64, "buzzers armed");
        self.commit(plan)
    }

    /// Settle the answer of the team that buzzed in.
    pub fn answer_question(&mut self, correct: bool) -> Result<(), GameError> {
        let exhausted = self.teams.playing().is_subset(&self.used);
        let event = if correct || exhausted {
            GameEvent::QuestionClosed
        } else {
            GameEvent::AnswerRejected
        };
        let plan = self.machine.plan(event)?;
        let team = self
            .teams
            .current()
            .map(|t| t.id)
            .ok_or_else(|| GameError::InvalidOperation("no team is answering".into()))?;
        if plan.from != GamePhase::TeamSelected {
            return Err(GameError::InvalidOperation(format!(
                "answers are only accepted once a team buzzed in (state is {:?})",
                plan.from
            )));
        }
        self.actions.clear();

        let question = self.questions.current();
        let (value, tiebreak) = (question.value, question.is_tiebreak);
        if correct {
            self.teams.add_points(team, value)?;
            self.questions.mark_answered();
            self.teams.set_selecting_as_current();
            self.actions.play_correct_sound = true;
            info!(team, value, "correct answer");
            return self.close_question(plan);
        }

        if !tiebreak {
            self.teams.add_points(team, -value)?;
        }
        self.actions.play_wrong_sound = true;
        info!(team, value, tiebreak, "wrong answer");

        if exhausted {
            self.teams.advance_selecting();
            info!("every team missed the question");
            return self.close_question(plan);
        }

        self.arbiter.disarm();
        self.lights((0..CONTROLLER_COUNT).collect(), false);
        self.commit(plan)
    }

    /// Drop the current question without scoring it.
    pub fn skip_question(&mut self) -> Result<(), GameError> {
        let plan = self.machine.plan(GameEvent::QuestionClosed)?;
        self.actions.clear();
        self.questions.mark_skipped();
        self.teams.set_current(0);
        info!(question = self.questions.current().id, "question skipped");
        self.close_question(plan)
    }

    /// Ask the display to stop its countdown.
    pub fn stop_timer(&mut self) -> Result<(), GameError> {
        if self.phase() == GamePhase::Over {
            return Err(GameError::InvalidOperation("the game is over".into()));
        }
        self.actions.clear();
        self.actions.stop_timer = true;
        Ok(())
    }

    /// Apply the split-or-steal votes once everybody voted and end the game.
    pub fn reveal_split_or_steal(&mut self) -> Result<(), GameError> {
        let plan = self.machine.plan(GameEvent::SplitOrStealRevealed)?;
        if let Some(missing) = self.teams.playing().iter().find(|c| !self.votes.contains_key(*c)) {
            return Err(GameError::InvalidOperation(format!(
                "controller {missing} has not voted yet"
            )));
        }
        let mut stealers: Vec<usize> = self
            .votes
            .iter()
            .filter(|(_, steal)| **steal)
            .map(|(member, _)| *member)
            .collect();
        stealers.sort_unstable();

        self.teams.settle_split_or_steal(&stealers)?;
        self.actions.clear();
        self.arbiter.disarm();
        self.actions.show_split_or_steal = true;
        self.actions.play_end_sound = true;
        info!(?stealers, "split or steal settled");
        self.commit(plan)
    }

    /// Moderator button press, applied as a press immediately followed by a release.
    pub fn buzz(&mut self, controller: usize, button: Button) -> Result<BuzzOutcome, GameError> {
        if controller >= CONTROLLER_COUNT {
            return Err(GameError::OutOfRange(format!(
                "controller {controller} is not in [0, {CONTROLLER_COUNT})"
            )));
        }
        let outcome = self.handle_frame(single_press(controller, button));
        self.handle_frame(ButtonFrame::default());
        Ok(outcome)
    }

    /// Feed one frame read from the controllers.
    pub fn handle_frame(&mut self, frame: ButtonFrame) -> BuzzOutcome {
        self.arbiter.ingest_frame(frame);
        match self.phase() {
            GamePhase::Starting | GamePhase::Over => BuzzOutcome::NoChange,
            GamePhase::SplitOrSteal => self.record_votes(),
            _ => self.arbitrate(),
        }
    }

    fn arbitrate(&mut self) -> BuzzOutcome {
        let now = self.clock.now();
        match self.arbiter.arbitrate(self.teams.playing(), &self.used, now) {
            Arbitration::Winner(controller) => match self.machine.plan(GameEvent::BuzzAdmitted) {
                Ok(plan) => {
                    self.actions.clear();
                    self.admit(controller);
                    match self.commit(plan) {
                        Ok(()) => BuzzOutcome::Admitted(controller),
                        Err(err) => {
                            warn!(error = %err, "failed to apply buzz admission");
                            BuzzOutcome::NoChange
                        }
                    }
                }
                Err(err) => {
                    warn!(controller, error = %err, "armed window outside of answering");
                    self.arbiter.disarm();
                    BuzzOutcome::NoChange
                }
            },
            Arbitration::FalseStart(controllers) => BuzzOutcome::Penalized(controllers),
            Arbitration::Idle | Arbitration::WindowClosed | Arbitration::Penalized(_) => {
                BuzzOutcome::NoChange
            }
        }
    }

    fn admit(&mut self, controller: usize) {
        self.arbiter.disarm();
        let others = (0..CONTROLLER_COUNT).filter(|c| *c != controller).collect();
        self.lights(others, false);
        self.used.insert(controller);
        self.teams.set_current(controller);
        self.actions.play_buzzer_sound = true;
    }

    fn record_votes(&mut self) -> BuzzOutcome {
        let votes = self
            .arbiter
            .collect_votes(self.teams.playing(), &self.used, self.clock.now());
        if votes.is_empty() {
            return BuzzOutcome::NoChange;
        }

        self.actions.clear();
        for (controller, steal) in &votes {
            info!(controller, steal, "split or steal vote");
            self.used.insert(*controller);
            self.votes.insert(*controller, *steal);
        }
        self.actions.play_buzzer_sound = true;
        self.lights(votes.iter().map(|(c, _)| *c).collect(), false);

        if self.teams.playing().iter().all(|c| self.votes.contains_key(c)) {
            self.arbiter.disarm();
            self.actions.show_split_or_steal = true;
            info!("every member voted");
        }
        BuzzOutcome::Voted(votes)
    }

    /// Adjust a team balance by hand.
    pub fn add_points(&mut self, team: usize, delta: i32) -> Result<(), GameError> {
        self.teams.add_points(team, delta)?;
        self.actions.clear();
        info!(team, delta, "points adjusted");
        Ok(())
    }

    /// Jump to any phase. The window is closed and lights go off.
    pub fn force_state(&mut self, phase: GamePhase) -> Result<(), GameError> {
        let plan = self.machine.plan(GameEvent::Override(phase))?;
        self.actions.clear();
        self.arbiter.disarm();
        self.lights((0..CONTROLLER_COUNT).collect(), false);
        warn!(from = ?plan.from, to = ?phase, "state forced");
        self.commit(plan)
    }

    /// Hand the board to another team.
    pub fn set_selecting(&mut self, team: usize) -> Result<(), GameError> {
        self.teams.set_selecting(team)?;
        self.actions.clear();
        Ok(())
    }

    fn close_question(&mut self, plan: Plan) -> Result<(), GameError> {
        self.used.clear();
        self.arbiter.disarm();
        self.lights((0..CONTROLLER_COUNT).collect(), false);
        self.commit(plan)?;

        if self.questions.all_regular_answered() {
            self.end_game()?;
        }
        Ok(())
    }

    fn end_game(&mut self) -> Result<(), GameError> {
        if self.teams.is_tied() {
            match self.questions.advance_tiebreak() {
                Ok(()) => {
                    info!(playing = ?self.teams.playing(), "tie; starting tie-break question");
                    self.machine.transition(GameEvent::TieBreakStarted)?;
                    return Ok(());
                }
                Err(err) => {
                    error!(error = %err, "no tie-break question left; ending the game");
                    return self.finish();
                }
            }
        }

        let winner = self.teams.winning_team().map(|t| (t.id, t.names.len()));
        match winner {
            Some((team, members)) if members > 1 && self.settings.split_or_steal => {
                self.teams.restrict_playing(0..members);
                self.votes.clear();
                info!(team, members, "split or steal round");
                self.machine.transition(GameEvent::SplitOrStealStarted)?;
                Ok(())
            }
            _ => self.finish(),
        }
    }

    fn finish(&mut self) -> Result<(), GameError> {
        self.machine.transition(GameEvent::Finish)?;
        self.actions.play_end_sound = true;
        info!(winner = ?self.teams.winning_team().map(|t| t.id), "game over");
        Ok(())
    }

    fn commit(&mut self, plan: Plan) -> Result<(), GameError> {
        self.machine.apply(plan)?;
        Ok(())
    }

    fn lights(&mut self, controllers: Vec<usize>, on: bool) {
        if controllers.is_empty() {
            return;
        }
        self.lights.push(LightCommand { controllers, on });
    }
}
