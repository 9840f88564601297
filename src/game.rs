/// Wordle is a game where you have to guess a word. The word is chosen once per
/// day by a remote service, and you have 6 attempts to guess it. After each
/// attempt the service tells you which letters you guessed correctly, and which
/// letters are in the word but in the wrong position.
///
/// This module implements the shared game state. A `Game` is driven from two
/// sides at once: the console (or any other front end) submits guesses, and the
/// background fetch worker reports what the remote service said about them.
/// Every field lives behind a single lock, and all state-change notifications
/// are delivered through a broadcast channel after the lock is released, so a
/// subscriber can freely query the game from inside its event loop.
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, warn};

/// Length of every answer and guess.
pub const WORD_LENGTH: usize = 5;

/// Number of attempts before the game is lost.
pub const MAX_GUESSES: usize = 6;

/// State of a single letter within an attempted word.
///
/// `correct_position` comes from the remote service and is trusted as-is;
/// `in_word` is recomputed locally (see `resolve_letter_states`) because the
/// service double-counts repeated letters.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct LetterState {
    pub letter: char,
    pub in_word: bool,
    pub correct_position: bool,
}

/// The outcome of one validated guess, as recorded in the game history.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GuessResult {
    pub word: String,
    pub is_valid_word: bool,
    pub is_correct: bool,
    pub letter_states: Vec<LetterState>,
}

/// How often, and where, a letter occurs in the answer. Built once when the
/// answer arrives and read-only afterwards.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LetterOccurrence {
    pub count: usize,
    pub positions: Vec<usize>,
}

/// Phase represents the current player state of a game.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    Initializing,
    Playing,
    Won,
    Lost,
}

/// Best known feedback for a letter across all guesses so far, for rendering
/// an on-screen keyboard or an attempted-letters line.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LetterHint {
    Correct,
    InWord,
    Absent,
}

/// Events pushed to subscribers whenever the game state moves.
///
/// Events are sent only after the internal lock has been released, and each
/// subscriber receives them on its own task. On `StateChanged` the subscriber
/// re-reads whatever state it cares about.
#[derive(Debug, Clone)]
pub enum GameEvent {
    StateChanged,
    InvalidWord { word: String },
    Error { message: String },
}

#[derive(Default)]
struct State {
    answer: String,
    occurrences: HashMap<char, LetterOccurrence>,
    initialized: bool,
    awaiting_result: bool,
    pending_guess: Option<String>,
    history: Vec<GuessResult>,
    won: bool,
    over: bool,
}

/// Game is the synchronized aggregate shared between the console task and the
/// fetch worker. At most one guess is ever in flight: `submit_guess` is the
/// sole admission gate, and the guess channel it feeds has capacity one.
pub struct Game {
    state: RwLock<State>,
    guess_tx: mpsc::Sender<String>,
    events: broadcast::Sender<GameEvent>,
}

impl Game {
    /// `new` creates a game plus the receiving end of the guess channel, which
    /// the fetch worker consumes.
    pub fn new() -> (Arc<Game>, mpsc::Receiver<String>) {
        let (guess_tx, guess_rx) = mpsc::channel(1);
        let (events, _) = broadcast::channel(16);
        let game = Arc::new(Game {
            state: RwLock::new(State::default()),
            guess_tx,
            events,
        });
        (game, guess_rx)
    }

    /// Subscribe to game events. Missed events are not replayed; a fresh
    /// subscriber should query the current state first.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// `mark_initialized` installs the answer fetched by the worker and builds
    /// the letter occurrence table. The first call wins; a repeated call is
    /// ignored.
    pub async fn mark_initialized(&self, answer: impl Into<String>) {
        {
            let mut state = self.state.write().await;
            if state.initialized {
                warn!("Game already initialized, keeping the original answer");
                return;
            }
            let answer = answer.into().to_uppercase();
            state.occurrences = letter_occurrences(&answer);
            state.answer = answer;
            state.initialized = true;
        }
        self.notify(GameEvent::StateChanged);
    }

    /// `submit_guess` is the consumer-facing entry point. It admits the word,
    /// marks it in flight and hands it to the fetch worker. Returns false
    /// without touching any state when the word is not 5 letters, the game is
    /// not ready, another guess is in flight, or the game is over.
    ///
    /// This never blocks on the network; the answer arrives later as a
    /// `StateChanged`, `InvalidWord` or `Error` event.
    pub async fn submit_guess(&self, word: impl Into<String>) -> bool {
        let word = word.into().to_uppercase();
        if word.chars().count() != WORD_LENGTH || !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return false;
        }

        {
            let mut state = self.state.write().await;
            if !state.initialized || state.awaiting_result || state.over {
                return false;
            }
            state.pending_guess = Some(word.clone());
            state.awaiting_result = true;
        }

        // The admission gate above guarantees the single channel slot is free,
        // so this only fails when the worker is gone. Roll back so the
        // consumer is not stuck waiting on a result that will never come.
        if self.guess_tx.try_send(word).is_err() {
            warn!("Fetch worker is not running, dropping guess");
            let mut state = self.state.write().await;
            state.pending_guess = None;
            state.awaiting_result = false;
            return false;
        }
        true
    }

    /// `report_result` is called by the fetch worker once the remote service
    /// has scored a guess. A valid word gets its `in_word` flags recomputed,
    /// is appended to the history and may end the game; an invalid word only
    /// raises `InvalidWord`. Either way the in-flight slot is released.
    pub async fn report_result(&self, mut result: GuessResult) {
        let invalid_word = {
            let mut state = self.state.write().await;
            state.pending_guess = None;
            state.awaiting_result = false;

            if result.is_valid_word {
                resolve_letter_states(&state.occurrences, &mut result.letter_states);
                let correct = result.is_correct;
                state.history.push(result);
                if correct {
                    state.won = true;
                    state.over = true;
                } else if state.history.len() >= MAX_GUESSES {
                    state.over = true;
                }
                None
            } else {
                // `is_correct` on a word the dictionary rejected is discarded.
                Some(result.word)
            }
        };

        if let Some(word) = invalid_word {
            self.notify(GameEvent::InvalidWord { word });
        }
        self.notify(GameEvent::StateChanged);
    }

    /// `report_error` is called by the fetch worker when the remote call
    /// itself failed. The in-flight slot is released unconditionally so the
    /// player can retry the same word.
    pub async fn report_error(&self, message: impl Into<String>) {
        {
            let mut state = self.state.write().await;
            state.pending_guess = None;
            state.awaiting_result = false;
        }
        self.notify(GameEvent::Error {
            message: message.into(),
        });
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    pub async fn is_awaiting_result(&self) -> bool {
        self.state.read().await.awaiting_result
    }

    /// The guess currently being checked, if any. Present exactly while
    /// `is_awaiting_result` is true.
    pub async fn pending_guess(&self) -> Option<String> {
        self.state.read().await.pending_guess.clone()
    }

    pub async fn is_over(&self) -> bool {
        self.state.read().await.over
    }

    pub async fn has_won(&self) -> bool {
        self.state.read().await.won
    }

    /// The answer for this session. Empty until initialized.
    pub async fn answer(&self) -> String {
        self.state.read().await.answer.clone()
    }

    /// A snapshot of the guess history. The returned vector is detached from
    /// the game, so later guesses never show up in an old snapshot.
    pub async fn history(&self) -> Vec<GuessResult> {
        self.state.read().await.history.clone()
    }

    pub async fn phase(&self) -> Phase {
        let state = self.state.read().await;
        if !state.initialized {
            Phase::Initializing
        } else if state.won {
            Phase::Won
        } else if state.over {
            Phase::Lost
        } else {
            Phase::Playing
        }
    }

    /// `attempted_letters` returns a sorted deduplicated vector of all the
    /// letters that have been attempted so far.
    pub async fn attempted_letters(&self) -> Vec<char> {
        let state = self.state.read().await;
        let mut letters = state
            .history
            .iter()
            .flat_map(|g| g.letter_states.iter())
            .map(|l| l.letter)
            .collect::<Vec<_>>();
        letters.sort();
        letters.dedup();
        letters
    }

    /// `letter_hints` folds the whole history into the best known feedback per
    /// letter: correct position beats in-word, which beats absent. This is the
    /// query an on-screen keyboard colors its keys from.
    pub async fn letter_hints(&self) -> HashMap<char, LetterHint> {
        let state = self.state.read().await;
        let mut hints = HashMap::new();
        for letter in state.history.iter().flat_map(|g| g.letter_states.iter()) {
            let hint = if letter.correct_position {
                LetterHint::Correct
            } else if letter.in_word {
                LetterHint::InWord
            } else {
                LetterHint::Absent
            };
            let entry = hints.entry(letter.letter).or_insert(hint);
            if rank(hint) > rank(*entry) {
                *entry = hint;
            }
        }
        hints
    }

    fn notify(&self, event: GameEvent) {
        if self.events.send(event).is_err() {
            debug!("No event subscribers attached");
        }
    }
}

fn rank(hint: LetterHint) -> u8 {
    match hint {
        LetterHint::Correct => 2,
        LetterHint::InWord => 1,
        LetterHint::Absent => 0,
    }
}

/// Counts how many times each letter appears in the answer, and where.
pub(crate) fn letter_occurrences(answer: &str) -> HashMap<char, LetterOccurrence> {
    let mut table: HashMap<char, LetterOccurrence> = HashMap::new();
    for (i, c) in answer.chars().enumerate() {
        let entry = table.entry(c).or_default();
        entry.count += 1;
        entry.positions.push(i);
    }
    table
}

/// `resolve_letter_states` recomputes the `in_word` flag of every letter from
/// the answer's occurrence table, resolving duplicate letters the way Wordle
/// does. The `correct_position` flags are taken as authoritative.
///
/// Correct-position letters consume their occurrence first; the remaining
/// letters then claim what is left, left to right. A letter with no
/// unconsumed occurrences left is not in the word, so a guess with two E's
/// against an answer holding a single E highlights at most one of them.
pub(crate) fn resolve_letter_states(
    occurrences: &HashMap<char, LetterOccurrence>,
    letter_states: &mut [LetterState],
) {
    let mut consumed: HashMap<char, usize> = HashMap::new();
    for letter in letter_states.iter_mut() {
        if letter.correct_position {
            // A letter in the right spot is by definition in the word.
            letter.in_word = true;
            *consumed.entry(letter.letter).or_insert(0) += 1;
        }
    }

    for letter in letter_states.iter_mut() {
        if letter.correct_position {
            continue;
        }
        match occurrences.get(&letter.letter) {
            Some(occurrence) => {
                let used = consumed.entry(letter.letter).or_insert(0);
                if *used < occurrence.count {
                    letter.in_word = true;
                    *used += 1;
                } else {
                    letter.in_word = false;
                }
            }
            None => letter.in_word = false,
        }
    }
}
