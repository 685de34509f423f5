use std::collections::BTreeSet;

use crate::{error::GameError, state::CONTROLLER_COUNT};

/// Largest number of members on one roster.
pub const MAX_MEMBERS: usize = 4;

/// A team and its running balance. Team `i` plays on controller `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Position in the registry.
    pub id: usize,
    /// Member names. During split-or-steal member `i` votes on controller `i`.
    pub names: Vec<String>,
    /// Points, possibly negative.
    pub balance: i32,
}

impl Team {
    fn new(id: usize, names: Vec<String>) -> Self {
        Self {
            id,
            names,
            balance: 0,
        }
    }
}

/// Roster, balances and turn order.
#[derive(Debug, Clone, Default)]
pub struct TeamRegistry {
    teams: Vec<Team>,
    current: usize,
    selecting: usize,
    playing: BTreeSet<usize>,
}

impl TeamRegistry {
    /// Empty registry; every lookup yields `None` until [`set_teams`](Self::set_teams).
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted values.
    pub fn restore(
        teams: Vec<Team>,
        current: usize,
        selecting: usize,
        playing: BTreeSet<usize>,
    ) -> Self {
        Self {
            teams,
            current,
            selecting,
            playing,
        }
    }

    /// Replace the roster. Ids are sequential, balances and cursors reset, everyone plays.
    pub fn set_teams(&mut self, rosters: Vec<Vec<String>>) -> Result<(), GameError> {
        if rosters.is_empty() {
            return Err(GameError::Config("at least one team is required".into()));
        }
        if rosters.len() > CONTROLLER_COUNT {
            return Err(GameError::Config(format!(
                "too many teams (max {CONTROLLER_COUNT})"
            )));
        }
        for (idx, roster) in rosters.iter().enumerate() {
            if roster.is_empty() {
                return Err(GameError::Config(format!("team {idx} has no members")));
            }
            if roster.len() > MAX_MEMBERS {
                return Err(GameError::Config(format!(
                    "too many players in team {idx} (max {MAX_MEMBERS})"
                )));
            }
            if roster.iter().any(|name| name.trim().is_empty()) {
                return Err(GameError::Config(format!("team {idx} has a blank name")));
            }
        }

        self.teams = rosters
            .into_iter()
            .enumerate()
            .map(|(id, names)| Team::new(id, names))
            .collect();
        self.current = 0;
        self.selecting = 0;
        self.playing = (0..self.teams.len()).collect();
        Ok(())
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn by_id(&self, id: usize) -> Option<&Team> {
        self.teams.get(id)
    }

    /// Team currently answering. `None` when the cursor points past the roster.
    pub fn current(&self) -> Option<&Team> {
        self.teams.get(self.current)
    }

    /// Team picking the next question. `None` when the cursor points past the roster.
    pub fn selecting(&self) -> Option<&Team> {
        self.teams.get(self.selecting)
    }

    pub fn current_id(&self) -> usize {
        self.current
    }

    pub fn selecting_id(&self) -> usize {
        self.selecting
    }

    pub fn set_current(&mut self, id: usize) {
        self.current = id;
    }

    pub fn set_selecting(&mut self, id: usize) -> Result<(), GameError> {
        self.check_id(id)?;
        self.selecting = id;
        Ok(())
    }

    pub fn set_selecting_as_current(&mut self) {
        self.selecting = self.current;
    }

    /// Hand the selection to the next controller. The modulus is the controller count, not
    /// the team count, so with fewer teams the cursor can land on an empty seat.
    pub fn advance_selecting(&mut self) {
        self.selecting = (self.selecting + 1) % CONTROLLER_COUNT;
    }

    /// Unconditional balance change.
    pub fn add_points(&mut self, id: usize, delta: i32) -> Result<(), GameError> {
        self.check_id(id)?;
        let team = &mut self.teams[id];
        team.balance = team.balance.saturating_add(delta);
        Ok(())
    }

    /// Controllers allowed to take part in the current round.
    pub fn playing(&self) -> &BTreeSet<usize> {
        &self.playing
    }

    pub fn restrict_playing(&mut self, playing: impl IntoIterator<Item = usize>) {
        self.playing = playing.into_iter().collect();
    }

    /// When two or more teams share the best balance, narrow `playing` to them.
    pub fn is_tied(&mut self) -> bool {
        let Some(best) = self.teams.iter().map(|t| t.balance).max() else {
            return false;
        };
        let leaders: BTreeSet<usize> = self
            .teams
            .iter()
            .filter(|t| t.balance == best)
            .map(|t| t.id)
            .collect();
        if leaders.len() < 2 {
            return false;
        }
        self.playing = leaders;
        true
    }

    /// First team holding the strictly greatest balance.
    pub fn winning_team(&self) -> Option<&Team> {
        self.teams.iter().fold(None, |best: Option<&Team>, team| match best {
            Some(b) if team.balance <= b.balance => Some(b),
            _ => Some(team),
        })
    }

    /// Settle the split-or-steal round on the winning team.
    ///
    /// Several stealers void the prize. A single stealer leaves with it as a new team.
    pub fn settle_split_or_steal(&mut self, stealers: &[usize]) -> Result<(), GameError> {
        let winner = self
            .winning_team()
            .map(|t| t.id)
            .ok_or_else(|| GameError::InvalidOperation("no teams registered".into()))?;
        let members = self.teams[winner].names.len();
        if let Some(bad) = stealers.iter().find(|m| **m >= members) {
            return Err(GameError::OutOfRange(format!(
                "member {bad} is not on team {winner}"
            )));
        }

        match stealers {
            [] => {}
            [stealer] => {
                let new_id = self.teams.len();
                let team = &mut self.teams[winner];
                let name = team.names.remove(*stealer);
                let prize = std::mem::take(&mut team.balance);
                self.teams.push(Team {
                    id: new_id,
                    names: vec![name],
                    balance: prize,
                });
            }
            _ => self.teams[winner].balance = 0,
        }
        Ok(())
    }

    fn check_id(&self, id: usize) -> Result<(), GameError> {
        if id >= self.teams.len() {
            return Err(GameError::OutOfRange(format!(
                "team {id} is not in [0, {})",
                self.teams.len()
            )));
        }
        Ok(())
    }
}
