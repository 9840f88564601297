use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::api::WordApi;
use crate::game::{Game, GameEvent, GuessResult, LetterState};
use crate::worker::FetchWorker;

/// Scripted stand-in for the remote service: one canned answer and a queue of
/// responses handed out per validation call.
struct FakeApi {
    answer: Option<String>,
    results: Mutex<VecDeque<Result<GuessResult>>>,
}

impl FakeApi {
    fn new(answer: Option<&str>) -> FakeApi {
        FakeApi {
            answer: answer.map(String::from),
            results: Mutex::new(VecDeque::new()),
        }
    }

    fn with_results(answer: &str, results: Vec<Result<GuessResult>>) -> FakeApi {
        FakeApi {
            answer: Some(answer.to_string()),
            results: Mutex::new(results.into()),
        }
    }
}

#[async_trait]
impl WordApi for FakeApi {
    async fn fetch_answer(&self) -> Result<String> {
        self.answer
            .clone()
            .ok_or_else(|| anyhow!("answer service is down"))
    }

    async fn validate_guess(&self, word: &str) -> Result<GuessResult> {
        self.results
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("unexpected guess {}", word)))
    }
}

fn raw_valid(word: &str) -> GuessResult {
    GuessResult {
        word: word.to_uppercase(),
        is_valid_word: true,
        is_correct: false,
        // in_word flags deliberately over-claimed; the game recomputes them.
        letter_states: word
            .to_uppercase()
            .chars()
            .map(|letter| LetterState {
                letter,
                in_word: true,
                correct_position: false,
            })
            .collect(),
    }
}

fn invalid(word: &str) -> GuessResult {
    GuessResult {
        word: word.to_uppercase(),
        is_valid_word: false,
        is_correct: false,
        letter_states: Vec::new(),
    }
}

fn start(
    api: FakeApi,
) -> (
    Arc<Game>,
    mpsc::Sender<()>,
    JoinHandle<()>,
    broadcast::Receiver<GameEvent>,
) {
    let (game, guess_rx) = Game::new();
    let events = game.subscribe();
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(FetchWorker::new(game.clone(), api, guess_rx, shutdown_rx).run());
    (game, shutdown_tx, task, events)
}

async fn next_event(events: &mut broadcast::Receiver<GameEvent>) -> GameEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a game event")
        .expect("event stream closed")
}

#[tokio::test]
async fn initializes_the_game_from_the_fetched_answer() {
    let (game, _shutdown_tx, _task, mut events) = start(FakeApi::new(Some("speed")));

    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));
    assert!(game.is_initialized().await);
    assert_eq!(game.answer().await, "SPEED");
}

#[tokio::test]
async fn failed_answer_fetch_is_fatal() {
    let (game, _shutdown_tx, task, mut events) = start(FakeApi::new(None));

    assert!(matches!(next_event(&mut events).await, GameEvent::Error { .. }));

    // The worker gives up on its own, no shutdown signal needed.
    timeout(Duration::from_secs(5), task)
        .await
        .expect("worker did not stop")
        .expect("worker panicked");

    assert!(!game.is_initialized().await);
    assert!(!game.submit_guess("CRANE").await);
}

#[tokio::test]
async fn scores_a_valid_guess() {
    let api = FakeApi::with_results("speed", vec![Ok(raw_valid("erase"))]);
    let (game, _shutdown_tx, _task, mut events) = start(api);

    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));
    assert!(game.submit_guess("erase").await);
    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));

    assert!(!game.is_awaiting_result().await);
    let history = game.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].word, "ERASE");
    // E resolved against SPEED's two E's, R resolved out.
    assert!(history[0].letter_states[0].in_word);
    assert!(!history[0].letter_states[1].in_word);
}

#[tokio::test]
async fn invalid_word_raises_notification_only() {
    let api = FakeApi::with_results("speed", vec![Ok(invalid("zzzzz"))]);
    let (game, _shutdown_tx, _task, mut events) = start(api);

    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));
    assert!(game.submit_guess("zzzzz").await);

    assert!(matches!(
        next_event(&mut events).await,
        GameEvent::InvalidWord { word } if word == "ZZZZZ"
    ));
    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));

    assert!(game.history().await.is_empty());
    assert!(!game.is_awaiting_result().await);
}

#[tokio::test]
async fn transport_error_clears_the_slot_and_allows_retry() {
    let api = FakeApi::with_results(
        "speed",
        vec![Err(anyhow!("request timed out")), Ok(raw_valid("erase"))],
    );
    let (game, _shutdown_tx, _task, mut events) = start(api);

    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));
    assert!(game.submit_guess("erase").await);

    assert!(matches!(next_event(&mut events).await, GameEvent::Error { .. }));
    assert!(!game.is_awaiting_result().await);
    assert!(game.history().await.is_empty());

    // Retry goes through and gets scored.
    assert!(game.submit_guess("erase").await);
    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));
    assert_eq!(game.history().await.len(), 1);
}

#[tokio::test]
async fn stops_on_shutdown_signal() {
    let (_game, shutdown_tx, task, mut events) = start(FakeApi::new(Some("speed")));

    assert!(matches!(next_event(&mut events).await, GameEvent::StateChanged));
    shutdown_tx.send(()).await.expect("worker already gone");

    timeout(Duration::from_secs(5), task)
        .await
        .expect("worker did not stop")
        .expect("worker panicked");
}
