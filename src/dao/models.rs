use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::{
    error::GameError,
    state::{
        engine::GameProgress,
        questions::{Question, QuestionBank},
        state_machine::GamePhase,
        teams::{Team, TeamRegistry},
    },
};

/// Game phase as written in save files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEntity {
    Starting,
    SelectingQuestion,
    ReadingQuestion,
    AnsweringQuestion,
    TeamSelected,
    SplitOrSteal,
    Over,
}

impl From<GamePhase> for PhaseEntity {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Starting => PhaseEntity::Starting,
            GamePhase::SelectingQuestion => PhaseEntity::SelectingQuestion,
            GamePhase::ReadingQuestion => PhaseEntity::ReadingQuestion,
            GamePhase::AnsweringQuestion => PhaseEntity::AnsweringQuestion,
            GamePhase::TeamSelected => PhaseEntity::TeamSelected,
            GamePhase::SplitOrSteal => PhaseEntity::SplitOrSteal,
            GamePhase::Over => PhaseEntity::Over,
        }
    }
}

impl From<PhaseEntity> for GamePhase {
    fn from(value: PhaseEntity) -> Self {
        match value {
            PhaseEntity::Starting => GamePhase::Starting,
            PhaseEntity::SelectingQuestion => GamePhase::SelectingQuestion,
            PhaseEntity::ReadingQuestion => GamePhase::ReadingQuestion,
            PhaseEntity::AnsweringQuestion => GamePhase::AnsweringQuestion,
            PhaseEntity::TeamSelected => GamePhase::TeamSelected,
            PhaseEntity::SplitOrSteal => GamePhase::SplitOrSteal,
            PhaseEntity::Over => GamePhase::Over,
        }
    }
}

/// Question stored in a save, including its answered flag.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    pub id: usize,
    pub statement: String,
    pub answer: String,
    #[serde(default)]
    pub image: Option<String>,
    pub value: i32,
    pub category: String,
    pub answered: bool,
    /// Buzz window in milliseconds.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "time_to_answer_ms")]
    pub time_to_answer: Duration,
    pub is_tiebreak: bool,
}

impl From<&Question> for QuestionEntity {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            statement: q.statement.clone(),
            answer: q.answer.clone(),
            image: q.image.clone(),
            value: q.value,
            category: q.category.clone(),
            answered: q.answered,
            time_to_answer: q.time_to_answer,
            is_tiebreak: q.is_tiebreak,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(q: QuestionEntity) -> Self {
        Self {
            id: q.id,
            statement: q.statement,
            answer: q.answer,
            image: q.image,
            value: q.value,
            category: q.category,
            answered: q.answered,
            time_to_answer: q.time_to_answer,
            is_tiebreak: q.is_tiebreak,
        }
    }
}

/// Team stored in a save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    pub id: usize,
    pub names: Vec<String>,
    pub balance: i32,
}

impl From<&Team> for TeamEntity {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            names: team.names.clone(),
            balance: team.balance,
        }
    }
}

impl From<TeamEntity> for Team {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            names: team.names,
            balance: team.balance,
        }
    }
}

/// Split-or-steal vote stored in a save.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEntity {
    pub controller: usize,
    pub steal: bool,
}

/// Aggregate game entity persisted by the save store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedGameEntity {
    pub phase: PhaseEntity,
    pub version: usize,
    pub questions: Vec<QuestionEntity>,
    pub tiebreak_questions: Vec<QuestionEntity>,
    /// Index into the regular or tie-break list, depending on `in_tiebreak`.
    pub question_cursor: usize,
    pub in_tiebreak: bool,
    pub teams: Vec<TeamEntity>,
    pub current_team: usize,
    pub selecting_team: usize,
    pub playing: Vec<usize>,
    pub already_answered: Vec<usize>,
    /// Votes in the order they were cast.
    pub votes: Vec<VoteEntity>,
}

impl From<&GameProgress> for SavedGameEntity {
    fn from(progress: &GameProgress) -> Self {
        let teams = &progress.teams;
        Self {
            phase: progress.phase.into(),
            version: progress.version,
            questions: progress.questions.regular().iter().map(Into::into).collect(),
            tiebreak_questions: progress.questions.tiebreak().iter().map(Into::into).collect(),
            question_cursor: progress.questions.cursor(),
            in_tiebreak: progress.questions.in_tiebreak(),
            teams: teams.teams().iter().map(Into::into).collect(),
            current_team: teams.current_id(),
            selecting_team: teams.selecting_id(),
            playing: teams.playing().iter().copied().collect(),
            already_answered: progress.used.iter().copied().collect(),
            votes: progress
                .votes
                .iter()
                .map(|(controller, steal)| VoteEntity {
                    controller: *controller,
                    steal: *steal,
                })
                .collect(),
        }
    }
}

impl TryFrom<SavedGameEntity> for GameProgress {
    type Error = GameError;

    fn try_from(entity: SavedGameEntity) -> Result<Self, Self::Error> {
        let questions = QuestionBank::from_parts(
            entity.questions.into_iter().map(Into::into).collect(),
            entity.tiebreak_questions.into_iter().map(Into::into).collect(),
            entity.question_cursor,
            entity.in_tiebreak,
        )?;
        let teams = TeamRegistry::restore(
            entity.teams.into_iter().map(Into::into).collect(),
            entity.current_team,
            entity.selecting_team,
            entity.playing.into_iter().collect(),
        );
        let votes: IndexMap<usize, bool> = entity
            .votes
            .into_iter()
            .map(|vote| (vote.controller, vote.steal))
            .collect();

        Ok(GameProgress {
            phase: entity.phase.into(),
            version: entity.version,
            questions,
            teams,
            used: entity.already_answered.into_iter().collect(),
            votes,
        })
    }
}
