//! Application-level configuration loading, including the question file.
use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::{
    error::GameError,
    state::{
        engine::EngineSettings,
        questions::{AnswerTime, QuestionBank, RegularQuestion, TiebreakQuestion},
    },
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUZZ_QUIZ_CONFIG_PATH";
const SPLIT_OR_STEAL_ENV: &str = "USE_SPLIT_OR_STEAL";
/// Penalty override, in seconds.
const BUZZ_PENALTY_ENV: &str = "BUZZ_PENALTY_TIMEOUT";
const LIGHTS_URL_ENV: &str = "LIGHTS_URL";

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Question file loaded at startup.
    pub questions_path: PathBuf,
    /// Directory holding saves; `null` disables saving.
    pub saves_dir: Option<PathBuf>,
    /// Restore the most recent save instead of starting fresh.
    pub resume_last_save: bool,
    pub split_or_steal: bool,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "buzz_penalty_ms")]
    pub buzz_penalty: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "min_answer_time_ms")]
    pub min_answer_time: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "max_answer_time_ms")]
    pub max_answer_time: Duration,
    /// Period of the controller polling loop.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "poll_interval_ms")]
    pub poll_interval: Duration,
    /// Base URL of the light controller; lights are only mirrored on virtual controllers when unset.
    pub lights_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            questions_path: PathBuf::from("config/questions.json"),
            saves_dir: Some(PathBuf::from("saves")),
            resume_last_save: false,
            split_or_steal: true,
            buzz_penalty: Duration::from_secs(5),
            min_answer_time: Duration::from_secs(10),
            max_answer_time: Duration::from_secs(20),
            poll_interval: Duration::from_millis(1),
            lights_url: None,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };
        config
            .with_overrides(|name| env::var(name).ok())
            .with_ordered_answer_times()
    }

    /// Apply overrides looked up through `lookup`; unparsable values are ignored.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(SPLIT_OR_STEAL_ENV) {
            match parse_flag(&raw) {
                Some(flag) => self.split_or_steal = flag,
                None => warn!(value = %raw, "ignoring invalid {SPLIT_OR_STEAL_ENV}"),
            }
        }
        if let Some(raw) = lookup(BUZZ_PENALTY_ENV) {
            match raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            {
                Some(penalty) => self.buzz_penalty = penalty,
                None => warn!(value = %raw, "ignoring invalid {BUZZ_PENALTY_ENV}"),
            }
        }
        if let Some(url) = lookup(LIGHTS_URL_ENV) {
            let url = url.trim();
            self.lights_url = (!url.is_empty()).then(|| url.to_string());
        }
        self
    }

    /// Swap the answer-time bounds when they are given in the wrong order.
    fn with_ordered_answer_times(mut self) -> Self {
        if self.min_answer_time > self.max_answer_time {
            warn!(
                min_ms = self.min_answer_time.as_millis() as u64,
                max_ms = self.max_answer_time.as_millis() as u64,
                "min_answer_time_ms is above max_answer_time_ms; swapping them"
            );
            std::mem::swap(&mut self.min_answer_time, &mut self.max_answer_time);
        }
        self
    }

    /// Engine tunables derived from the configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            split_or_steal: self.split_or_steal,
            buzz_penalty: self.buzz_penalty,
            vote_window: self.max_answer_time,
        }
    }

    /// Read and validate the question file.
    pub fn load_questions(&self) -> Result<QuestionBank, GameError> {
        let contents = fs::read_to_string(&self.questions_path).map_err(|err| {
            GameError::Config(format!(
                "failed to read {}: {err}",
                self.questions_path.display()
            ))
        })?;
        parse_question_file(
            &contents,
            AnswerTime {
                min: self.min_answer_time,
                max: self.max_answer_time,
            },
        )
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[derive(Debug, Deserialize)]
/// JSON representation of the question file.
struct RawQuestionFile {
    regular: IndexMap<String, Vec<RawRegular>>,
    #[serde(default)]
    tiebreaker: Vec<RawTiebreak>,
}

#[derive(Debug, Deserialize)]
struct RawRegular {
    question: String,
    answer: String,
    #[serde(default)]
    image: Option<String>,
    value: i32,
}

#[derive(Debug, Deserialize)]
struct RawTiebreak {
    question: String,
    answer: String,
    #[serde(default)]
    image: Option<String>,
}

/// Build the bank from a question file; categories keep their file order.
pub fn parse_question_file(contents: &str, answer_time: AnswerTime) -> Result<QuestionBank, GameError> {
    let raw: RawQuestionFile = serde_json::from_str(contents)
        .map_err(|err| GameError::Config(format!("malformed question file: {err}")))?;

    let regular = raw
        .regular
        .into_iter()
        .flat_map(|(category, questions)| {
            questions.into_iter().map(move |q| RegularQuestion {
                category: category.clone(),
                statement: q.question,
                answer: q.answer,
                image: q.image,
                value: q.value,
            })
        })
        .collect();
    let tiebreak = raw
        .tiebreaker
        .into_iter()
        .map(|q| TiebreakQuestion {
            statement: q.question,
            answer: q.answer,
            image: q.image,
        })
        .collect();

    QuestionBank::new(regular, tiebreak, answer_time)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const QUESTIONS: &str = r#"{
        "regular": {
            "Music": [
                {"question": "q1", "answer": "a1", "value": 100},
                {"question": "q2", "answer": "a2", "image": "q2.png", "value": 500}
            ],
            "Cinema": [{"question": "q3", "answer": "a3", "value": 300}]
        },
        "tiebreaker": [{"question": "t1", "answer": "ta1"}]
    }"#;

    fn answer_time() -> AnswerTime {
        AnswerTime {
            min: Duration::from_secs(10),
            max: Duration::from_secs(20),
        }
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"buzz_penalty_ms": 2500, "saves_dir": null}"#).unwrap();
        assert_eq!(config.buzz_penalty, Duration::from_millis(2500));
        assert_eq!(config.saves_dir, None);
        assert_eq!(config.max_answer_time, Duration::from_secs(20));
        assert!(config.split_or_steal);
    }

    #[test]
    fn environment_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            (SPLIT_OR_STEAL_ENV, "false"),
            (BUZZ_PENALTY_ENV, "1.5"),
            (LIGHTS_URL_ENV, "http://lights:8001"),
        ]);
        let config = AppConfig::default()
            .with_overrides(|name| env.get(name).map(|value| value.to_string()));
        assert!(!config.split_or_steal);
        assert_eq!(config.buzz_penalty, Duration::from_millis(1500));
        assert_eq!(config.lights_url.as_deref(), Some("http://lights:8001"));
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let config = AppConfig::default().with_overrides(|name| match name {
            SPLIT_OR_STEAL_ENV => Some("maybe".into()),
            BUZZ_PENALTY_ENV => Some("-3".into()),
            _ => None,
        });
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn oversized_penalty_override_is_ignored() {
        let config = AppConfig::default().with_overrides(|name| match name {
            BUZZ_PENALTY_ENV => Some("1e300".into()),
            _ => None,
        });
        assert_eq!(config.buzz_penalty, AppConfig::default().buzz_penalty);
    }

    #[test]
    fn inverted_answer_times_are_swapped() {
        let config: AppConfig =
            serde_json::from_str(r#"{"min_answer_time_ms": 30000, "max_answer_time_ms": 5000}"#)
                .unwrap();
        let config = config.with_ordered_answer_times();
        assert_eq!(config.min_answer_time, Duration::from_secs(5));
        assert_eq!(config.max_answer_time, Duration::from_secs(30));
        assert_eq!(config.engine_settings().vote_window, Duration::from_secs(30));
    }

    #[test]
    fn question_file_keeps_category_order() {
        let bank = parse_question_file(QUESTIONS, answer_time()).unwrap();
        let categories: Vec<_> = bank.regular().iter().map(|q| q.category.as_str()).collect();
        assert_eq!(categories, vec!["Music", "Music", "Cinema"]);
        assert_eq!(bank.regular()[1].image.as_deref(), Some("q2.png"));
        assert_eq!(bank.regular()[1].time_to_answer, Duration::from_secs(20));
        assert_eq!(bank.tiebreak()[0].id, 3);
    }

    #[test]
    fn malformed_question_files_are_fatal() {
        assert!(matches!(
            parse_question_file("{", answer_time()),
            Err(GameError::Config(_))
        ));
        // the tie-break sequence must have an odd length
        let even = r#"{"regular": {"A": [{"question": "q", "answer": "a", "value": 1}]},
            "tiebreaker": [{"question": "t1", "answer": "a"}, {"question": "t2", "answer": "a"}]}"#;
        assert!(matches!(
            parse_question_file(even, answer_time()),
            Err(GameError::Config(_))
        ));
    }
}
