/// Console front end for the daily Wordle service. The main task owns the
/// terminal; a background worker owns the network. The two share a single
/// `Game` and talk through its guess channel and event stream.
use std::io::Write;

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::WordleApi;
use crate::game::{Game, GameEvent, LetterHint, MAX_GUESSES};
use crate::scoreboard::Scoreboard;
use crate::worker::FetchWorker;

mod api;
mod game;
mod scoreboard;
mod worker;

#[cfg(test)]
mod api_test;
#[cfg(test)]
mod worker_test;

#[derive(FromArgs)]
/// Guess the daily Wordle from your terminal.
struct Args {
    /// host of the Wordle API service
    #[argh(option, short = 'a', default = "String::from(api::DEFAULT_API_HOST)")]
    api_host: String,

    /// file where finished-game scores are kept
    #[argh(option, short = 'f', default = "String::from(\"scores.json\")")]
    score_file: String,

    /// name recorded on the scoreboard
    #[argh(option, short = 'n', default = "String::from(\"player\")")]
    name: String,

    /// print the high scores and exit
    #[argh(switch)]
    scores: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let args: Args = argh::from_env();
    let scoreboard = Scoreboard::new(&args.score_file);

    if args.scores {
        let scores = scoreboard.top_scores().await?;
        if scores.is_empty() {
            println!("No scores recorded yet.");
        }
        for entry in scores {
            println!("{:<20} {}", entry.name, entry.score);
        }
        return Ok(());
    }

    let api = WordleApi::new(&args.api_host)?;
    let (game, guess_rx) = Game::new();
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let mut events = game.subscribe();
    let worker = FetchWorker::new(game.clone(), api, guess_rx, shutdown_rx);
    let worker_task = tokio::spawn(worker.run());

    println!("Initializing game...");
    loop {
        match events.recv().await {
            Ok(GameEvent::Error { message }) => {
                eprintln!("Failed to initialize game. Please check your internet connection.");
                bail!(message);
            }
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                if game.is_initialized().await {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Closed) => bail!("Game events channel closed"),
        }
    }

    println!("Wordle started! Enter your 5-letter guesses, or QUIT to give up.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let used = game.history().await.len();
        print!("Enter guess ({}/{}): ", used + 1, MAX_GUESSES);
        std::io::stdout().flush().context("Error flushing stdout")?;

        let Some(line) = lines.next_line().await.context("Error reading input")? else {
            break;
        };
        let input = line.trim().to_uppercase();
        if input.is_empty() {
            continue;
        }
        if input == "QUIT" {
            break;
        }

        if !game.submit_guess(&input).await {
            println!("Please enter a valid 5-letter word.");
            continue;
        }

        if let Some(word) = game.pending_guess().await {
            println!("Checking {}...", word);
        }
        wait_for_result(&game, &mut events).await?;

        if game.has_won().await {
            println!("Congratulations! You've won!");
            break;
        }
        if game.is_over().await {
            println!("Game Over! The word was: {}", game.answer().await);
            break;
        }
    }

    if game.is_over().await {
        let used = game.history().await.len();
        let score = if game.has_won().await {
            (MAX_GUESSES - used + 1) as i64
        } else {
            0
        };
        match scoreboard.add_score(&args.name, score).await {
            Ok(()) => println!("Recorded score {} for {}.", score, args.name),
            Err(e) => warn!("Error saving score: {:#}", e),
        }
    }

    let _ = shutdown_tx.send(()).await;
    let _ = worker_task.await;
    Ok(())
}

/// Blocks the console on the event stream until the in-flight guess is
/// resolved one way or another: scored, rejected by the dictionary, or failed
/// at the transport. Stale events from earlier guesses are skipped by
/// re-checking the in-flight flag.
async fn wait_for_result(game: &Game, events: &mut broadcast::Receiver<GameEvent>) -> Result<()> {
    loop {
        match events.recv().await {
            Ok(GameEvent::InvalidWord { word }) => {
                println!("{} - Not a valid word!", word);
                return Ok(());
            }
            Ok(GameEvent::Error { message }) => {
                println!("Error: {}. Try again.", message);
                return Ok(());
            }
            Ok(GameEvent::StateChanged) | Err(broadcast::error::RecvError::Lagged(_)) => {
                if !game.is_awaiting_result().await {
                    render_game(game).await;
                    return Ok(());
                }
            }
            Err(broadcast::error::RecvError::Closed) => bail!("Game events channel closed"),
        }
    }
}

/// Prints the board and the attempted letters. Correct positions render as
/// `_X_`, in-word letters as `*X*`, absent letters plain.
async fn render_game(game: &Game) {
    let history = game.history().await;
    let mut board = String::from("\nGuess history:\n");
    for guess in &history {
        board.push_str(&guess.word);
        board.push_str(" - ");
        for letter in &guess.letter_states {
            if letter.correct_position {
                board.push_str(&format!("_{}_ ", letter.letter));
            } else if letter.in_word {
                board.push_str(&format!("*{}* ", letter.letter));
            } else {
                board.push_str(&format!(" {}  ", letter.letter));
            }
        }
        board.push('\n');
    }
    println!("{}", board);

    let attempted = game.attempted_letters().await;
    if !attempted.is_empty() {
        let hints = game.letter_hints().await;
        let line = attempted
            .iter()
            .map(|c| match hints.get(c) {
                Some(LetterHint::Correct) => format!("_{}_", c),
                Some(LetterHint::InWord) => format!("*{}*", c),
                _ => c.to_lowercase().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!("Attempted: {}\n", line);
    }
}
