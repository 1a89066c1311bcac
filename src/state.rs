use std::collections::VecDeque;

use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{CreatureRecord, NameCatalog};
use crate::config::Config;
use crate::suggest::filter_suggestions;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Playing,
    /// Last guess was right; waiting for the player to advance.
    Correct,
    /// Last guess was wrong. Only a restart leaves this phase.
    GameOver,
    LoadFailed {
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchCreature { generation: u64, id: u32 },
    FetchNameCatalog { limit: u32 },
}

#[derive(Debug, Clone)]
pub enum Delta {
    CreatureLoaded {
        generation: u64,
        record: CreatureRecord,
    },
    CreatureFailed {
        generation: u64,
        error: String,
    },
    NameCatalogLoaded(NameCatalog),
    NameCatalogFailed(String),
}

/// All mutable session state. Fields are private: the UI reads through the
/// accessors and changes state only via the transition methods and
/// [`apply_delta`].
#[derive(Debug)]
pub struct GameState {
    phase: Phase,
    current: Option<CreatureRecord>,
    guess_text: String,
    feedback: String,
    score: u32,
    best_score: u32,
    suggestions: Vec<String>,
    suggestion_cursor: Option<usize>,
    catalog: Option<NameCatalog>,
    catalog_pending: bool,
    generation: u64,
    total: u32,
    catalog_limit: u32,
    rng: StdRng,
    logs: VecDeque<String>,
}

impl GameState {
    pub fn new(total: u32, catalog_limit: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            phase: Phase::Loading,
            current: None,
            guess_text: String::new(),
            feedback: String::new(),
            score: 0,
            best_score: 0,
            suggestions: Vec::new(),
            suggestion_cursor: None,
            catalog: None,
            catalog_pending: false,
            generation: 0,
            total: total.max(1),
            catalog_limit: catalog_limit.max(1),
            rng,
            logs: VecDeque::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.total, config.catalog_limit, config.seed)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn current(&self) -> Option<&CreatureRecord> {
        self.current.as_ref()
    }

    pub fn guess_text(&self) -> &str {
        &self.guess_text
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestion_cursor(&self) -> Option<usize> {
        self.suggestion_cursor
    }

    pub fn catalog(&self) -> Option<&NameCatalog> {
        self.catalog.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn logs(&self) -> &VecDeque<String> {
        &self.logs
    }

    /// Session start. Also requests the name catalog unless it is already
    /// loaded or on its way.
    pub fn start(&mut self) -> Vec<ProviderCommand> {
        self.score = 0;
        self.feedback.clear();
        self.begin_round()
    }

    pub fn submit_guess(&mut self) -> Option<GuessOutcome> {
        if self.phase != Phase::Playing {
            return None;
        }
        let name = self.current.as_ref()?.name.clone();

        let outcome = if self.guess_text.to_lowercase() == name.to_lowercase() {
            self.score += 1;
            self.best_score = self.best_score.max(self.score);
            self.feedback = format!("Correct! It's {name}!");
            self.phase = Phase::Correct;
            GuessOutcome::Correct
        } else {
            self.feedback = format!("Incorrect! It was {name}.");
            self.phase = Phase::GameOver;
            GuessOutcome::Incorrect
        };
        tracing::debug!(?outcome, score = self.score, "guess submitted");

        self.guess_text.clear();
        self.clear_suggestions();
        Some(outcome)
    }

    pub fn advance_round(&mut self) -> Vec<ProviderCommand> {
        if self.phase != Phase::Correct {
            return Vec::new();
        }
        self.feedback.clear();
        self.begin_round()
    }

    pub fn restart(&mut self) -> Vec<ProviderCommand> {
        if self.phase != Phase::GameOver {
            return Vec::new();
        }
        self.push_log(format!("[INFO] Restart (final score {})", self.score));
        self.score = 0;
        self.feedback.clear();
        self.begin_round()
    }

    pub fn retry(&mut self) -> Vec<ProviderCommand> {
        if !matches!(self.phase, Phase::LoadFailed { .. }) {
            return Vec::new();
        }
        self.begin_round()
    }

    pub fn set_guess_text(&mut self, text: impl Into<String>) {
        if self.phase != Phase::Playing {
            return;
        }
        self.guess_text = text.into();
        self.refresh_suggestions();
    }

    pub fn select_next_suggestion(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        let last = self.suggestions.len() - 1;
        self.suggestion_cursor = Some(match self.suggestion_cursor {
            None => 0,
            Some(idx) => (idx + 1).min(last),
        });
    }

    pub fn select_prev_suggestion(&mut self) {
        self.suggestion_cursor = match self.suggestion_cursor {
            None | Some(0) => None,
            Some(idx) => Some(idx - 1),
        };
    }

    /// Copies the highlighted suggestion (or the first one when nothing is
    /// highlighted) into the guess text. Does not submit.
    pub fn accept_suggestion(&mut self) -> bool {
        let idx = self.suggestion_cursor.unwrap_or(0);
        self.pick_suggestion(idx)
    }

    /// Same as accepting, for a suggestion chosen by position.
    pub fn pick_suggestion(&mut self, idx: usize) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let Some(name) = self.suggestions.get(idx).cloned() else {
            return false;
        };
        self.guess_text = name;
        self.suggestion_cursor = Some(idx);
        true
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn begin_round(&mut self) -> Vec<ProviderCommand> {
        self.generation += 1;
        self.phase = Phase::Loading;
        self.current = None;
        self.guess_text.clear();
        self.clear_suggestions();

        let id = self.rng.gen_range(1..=self.total);
        let mut commands = vec![ProviderCommand::FetchCreature {
            generation: self.generation,
            id,
        }];
        if self.catalog.is_none() && !self.catalog_pending {
            self.catalog_pending = true;
            commands.push(ProviderCommand::FetchNameCatalog {
                limit: self.catalog_limit,
            });
        }
        tracing::debug!(generation = self.generation, id, "round started");
        commands
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = match &self.catalog {
            Some(catalog) => filter_suggestions(catalog, &self.guess_text),
            None => Vec::new(),
        };
        self.suggestion_cursor = None;
    }

    fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.suggestion_cursor = None;
    }
}

pub fn apply_delta(state: &mut GameState, delta: Delta) {
    match delta {
        Delta::CreatureLoaded { generation, record } => {
            if generation != state.generation || state.phase != Phase::Loading {
                tracing::debug!(generation, current = state.generation, "stale creature dropped");
                state.push_log(format!("[INFO] Dropped stale response for #{}", record.id));
                return;
            }
            state.push_log(format!("[INFO] Creature #{} ready", record.id));
            state.current = Some(record);
            state.phase = Phase::Playing;
        }
        Delta::CreatureFailed { generation, error } => {
            if generation != state.generation || state.phase != Phase::Loading {
                tracing::debug!(generation, current = state.generation, "stale failure dropped");
                return;
            }
            tracing::warn!(%error, "creature fetch failed");
            state.push_log(format!("[WARN] Creature fetch failed: {error}"));
            state.phase = Phase::LoadFailed { error };
        }
        Delta::NameCatalogLoaded(catalog) => {
            state.push_log(format!("[INFO] Name catalog loaded ({} names)", catalog.len()));
            state.catalog = Some(catalog);
            state.catalog_pending = false;
            // Input typed before the catalog arrived gets its suggestions now.
            if state.phase == Phase::Playing && !state.guess_text.is_empty() {
                state.refresh_suggestions();
            }
        }
        Delta::NameCatalogFailed(error) => {
            tracing::warn!(%error, "name catalog fetch failed");
            state.catalog_pending = false;
            state.push_log(format!("[WARN] Name catalog fetch failed: {error}"));
        }
    }
}
