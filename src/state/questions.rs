use std::time::Duration;

use indexmap::IndexSet;

use crate::error::GameError;

/// Category assigned to every tie-break question.
pub const TIEBREAK_CATEGORY: &str = "Tiebreak";
/// Value carried by every tie-break question.
pub const TIEBREAK_VALUE: i32 = 100;

/// A question of the board or of the tie-break sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Board id; tie-break ids continue after the regular ones.
    pub id: usize,
    /// Text read by the host.
    pub statement: String,
    /// Expected answer, shown to the moderator.
    pub answer: String,
    /// Optional illustration.
    pub image: Option<String>,
    /// Points won or lost.
    pub value: i32,
    /// Board category.
    pub category: String,
    /// Whether the question was answered or skipped.
    pub answered: bool,
    /// Reading window granted once buzzers open.
    pub time_to_answer: Duration,
    /// Whether this question belongs to the tie-break sequence.
    pub is_tiebreak: bool,
}

/// Board question as authored in the question file.
#[derive(Debug, Clone)]
pub struct RegularQuestion {
    pub category: String,
    pub statement: String,
    pub answer: String,
    pub image: Option<String>,
    pub value: i32,
}

/// Tie-break question as authored in the question file.
#[derive(Debug, Clone)]
pub struct TiebreakQuestion {
    pub statement: String,
    pub answer: String,
    pub image: Option<String>,
}

/// Bounds of the answer budget, mapped linearly onto question values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerTime {
    pub min: Duration,
    pub max: Duration,
}

impl AnswerTime {
    fn for_value(&self, value: i32, lowest: i32, highest: i32) -> Duration {
        if highest <= lowest {
            return self.max;
        }
        let (min, max) = (self.min.as_millis() as i64, self.max.as_millis() as i64);
        let value = i64::from(value.clamp(lowest, highest));
        let (lowest, highest) = (i64::from(lowest), i64::from(highest));
        let ms = min + (max - min) * (value - lowest) / (highest - lowest);
        Duration::from_millis(ms.max(0) as u64)
    }
}

/// Regular questions plus the odd-sized tie-break sequence, with the play cursor.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    regular: Vec<Question>,
    tiebreak: Vec<Question>,
    cursor: usize,
    in_tiebreak: bool,
}

impl QuestionBank {
    /// Build the bank, assigning ids and answer budgets.
    pub fn new(
        regular: Vec<RegularQuestion>,
        tiebreak: Vec<TiebreakQuestion>,
        answer_time: AnswerTime,
    ) -> Result<Self, GameError> {
        let lowest = regular.iter().map(|q| q.value).min().unwrap_or_default();
        let highest = regular.iter().map(|q| q.value).max().unwrap_or_default();

        let regular: Vec<Question> = regular
            .into_iter()
            .enumerate()
            .map(|(id, q)| Question {
                id,
                time_to_answer: answer_time.for_value(q.value, lowest, highest),
                statement: q.statement,
                answer: q.answer,
                image: q.image,
                value: q.value,
                category: q.category,
                answered: false,
                is_tiebreak: false,
            })
            .collect();

        let offset = regular.len();
        let tiebreak = tiebreak
            .into_iter()
            .enumerate()
            .map(|(idx, q)| Question {
                id: offset + idx,
                statement: q.statement,
                answer: q.answer,
                image: q.image,
                value: TIEBREAK_VALUE,
                category: TIEBREAK_CATEGORY.to_owned(),
                answered: false,
                time_to_answer: answer_time.max,
                is_tiebreak: true,
            })
            .collect();

        Self::from_parts(regular, tiebreak, 0, false)
    }

    /// Rebuild a bank from already materialised questions (used when restoring a save).
    pub fn from_parts(
        regular: Vec<Question>,
        tiebreak: Vec<Question>,
        cursor: usize,
        in_tiebreak: bool,
    ) -> Result<Self, GameError> {
        if regular.is_empty() {
            return Err(GameError::Config(
                "at least one regular question is required".into(),
            ));
        }
        if tiebreak.len() % 2 == 0 {
            return Err(GameError::Config(format!(
                "there must be an odd number of tie-break questions (got {})",
                tiebreak.len()
            )));
        }
        let bound = if in_tiebreak {
            tiebreak.len()
        } else {
            regular.len()
        };
        if cursor >= bound {
            return Err(GameError::Config(format!(
                "question cursor {cursor} is out of range"
            )));
        }

        Ok(Self {
            regular,
            tiebreak,
            cursor,
            in_tiebreak,
        })
    }

    /// Question being played.
    pub fn current(&self) -> &Question {
        if self.in_tiebreak {
            &self.tiebreak[self.cursor]
        } else {
            &self.regular[self.cursor]
        }
    }

    fn current_mut(&mut self) -> &mut Question {
        if self.in_tiebreak {
            &mut self.tiebreak[self.cursor]
        } else {
            &mut self.regular[self.cursor]
        }
    }

    /// Point the cursor at a board question. The `answered` flag is left alone.
    pub fn select(&mut self, id: i64) -> Result<(), GameError> {
        if self.in_tiebreak {
            return Err(GameError::InvalidOperation(
                "questions cannot be picked during a tie-break".into(),
            ));
        }
        let idx = usize::try_from(id)
            .ok()
            .filter(|idx| *idx < self.regular.len())
            .ok_or_else(|| {
                GameError::OutOfRange(format!(
                    "question {id} is not in [0, {})",
                    self.regular.len()
                ))
            })?;
        self.cursor = idx;
        Ok(())
    }

    /// Enter tie-break mode, or move to the next tie-break question.
    pub fn advance_tiebreak(&mut self) -> Result<(), GameError> {
        let next = if self.in_tiebreak { self.cursor + 1 } else { 0 };
        if next >= self.tiebreak.len() {
            return Err(GameError::Config(format!(
                "tie-break questions exhausted after {}",
                self.tiebreak.len()
            )));
        }
        self.in_tiebreak = true;
        self.cursor = next;
        Ok(())
    }

    pub fn mark_answered(&mut self) {
        self.current_mut().answered = true;
    }

    pub fn mark_skipped(&mut self) {
        self.current_mut().answered = true;
    }

    /// Whether every board question is done. Tie-break questions do not count.
    pub fn all_regular_answered(&self) -> bool {
        self.regular.iter().all(|q| q.answered)
    }

    pub fn in_tiebreak(&self) -> bool {
        self.in_tiebreak
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Board question by id.
    pub fn get(&self, id: usize) -> Option<&Question> {
        self.regular.get(id)
    }

    pub fn regular(&self) -> &[Question] {
        &self.regular
    }

    pub fn tiebreak(&self) -> &[Question] {
        &self.tiebreak
    }

    /// Categories in the order they first appear on the board.
    pub fn categories(&self) -> Vec<&str> {
        self.regular
            .iter()
            .map(|q| q.category.as_str())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn regular(category: &str, value: i32) -> RegularQuestion {
        RegularQuestion {
            category: category.into(),
            statement: format!("{category} for {value}"),
            answer: "42".into(),
            image: None,
            value,
        }
    }

    pub(crate) fn tiebreak(statement: &str) -> TiebreakQuestion {
        TiebreakQuestion {
            statement: statement.into(),
            answer: "yes".into(),
            image: None,
        }
    }

    pub(crate) fn answer_time() -> AnswerTime {
        AnswerTime {
            min: Duration::from_secs(10),
            max: Duration::from_secs(20),
        }
    }

    /// Two categories of two questions each and three tie-breakers.
    pub(crate) fn sample_bank() -> QuestionBank {
        QuestionBank::new(
            vec![
                regular("Music", 100),
                regular("Music", 500),
                regular("Cinema", 300),
                regular("Cinema", 500),
            ],
            vec![tiebreak("t0"), tiebreak("t1"), tiebreak("t2")],
            answer_time(),
        )
        .unwrap()
    }

    #[test]
    fn even_tiebreak_count_is_rejected() {
        let err = QuestionBank::new(
            vec![regular("Music", 100)],
            vec![tiebreak("a"), tiebreak("b")],
            answer_time(),
        )
        .unwrap_err();
        assert!(matches!(err, GameError::Config(_)));

        let err = QuestionBank::new(vec![regular("Music", 100)], vec![], answer_time());
        assert!(matches!(err, Err(GameError::Config(_))));
    }

    #[test]
    fn empty_board_is_rejected() {
        let err = QuestionBank::new(vec![], vec![tiebreak("a")], answer_time()).unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
    }

    #[test]
    fn ids_continue_into_tiebreak_questions() {
        let bank = sample_bank();
        assert_eq!(bank.regular().len(), 4);
        let ids: Vec<_> = bank.tiebreak().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
        assert!(bank.tiebreak().iter().all(|q| q.value == TIEBREAK_VALUE
            && q.category == TIEBREAK_CATEGORY
            && q.is_tiebreak));
    }

    #[test]
    fn select_moves_cursor_without_answering() {
        let mut bank = sample_bank();
        bank.select(3).unwrap();
        assert_eq!(bank.current().id, 3);
        assert!(!bank.current().answered);
    }

    #[test]
    fn select_out_of_range_keeps_cursor() {
        let mut bank = sample_bank();
        bank.select(2).unwrap();

        assert!(matches!(bank.select(-1), Err(GameError::OutOfRange(_))));
        assert!(matches!(bank.select(4), Err(GameError::OutOfRange(_))));
        assert_eq!(bank.current().id, 2);
    }

    #[test]
    fn select_is_refused_during_tiebreak() {
        let mut bank = sample_bank();
        bank.advance_tiebreak().unwrap();
        assert!(matches!(
            bank.select(0),
            Err(GameError::InvalidOperation(_))
        ));
    }

    #[test]
    fn tiebreak_walks_the_sequence_then_overruns() {
        let mut bank = sample_bank();
        bank.advance_tiebreak().unwrap();
        assert_eq!(bank.current().id, 4);
        bank.advance_tiebreak().unwrap();
        bank.advance_tiebreak().unwrap();
        assert_eq!(bank.current().id, 6);

        assert!(matches!(bank.advance_tiebreak(), Err(GameError::Config(_))));
        assert_eq!(bank.current().id, 6);
    }

    #[test]
    fn all_regular_answered_ignores_tiebreak_questions() {
        let mut bank = sample_bank();
        for id in 0..4 {
            assert!(!bank.all_regular_answered());
            bank.select(id).unwrap();
            bank.mark_answered();
        }
        assert!(bank.all_regular_answered());
        assert!(bank.tiebreak().iter().all(|q| !q.answered));
    }

    #[test]
    fn marking_is_idempotent() {
        let mut bank = sample_bank();
        bank.mark_skipped();
        bank.mark_skipped();
        bank.mark_answered();
        assert!(bank.current().answered);
    }

    #[test]
    fn answer_budget_scales_with_value() {
        let bank = sample_bank();
        assert_eq!(bank.regular()[0].time_to_answer, Duration::from_secs(10));
        assert_eq!(bank.regular()[2].time_to_answer, Duration::from_secs(15));
        assert_eq!(bank.regular()[3].time_to_answer, Duration::from_secs(20));
    }

    #[test]
    fn uniform_values_get_the_full_budget() {
        let bank = QuestionBank::new(
            vec![regular("Music", 200), regular("Music", 200)],
            vec![tiebreak("t")],
            answer_time(),
        )
        .unwrap();
        assert!(
            bank.regular()
                .iter()
                .all(|q| q.time_to_answer == Duration::from_secs(20))
        );
    }

    #[test]
    fn categories_keep_board_order() {
        assert_eq!(sample_bank().categories(), vec!["Music", "Cinema"]);
    }
}
