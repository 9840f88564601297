/// The background fetch worker. It owns all traffic to the remote service so
/// the console task never blocks on the network: one answer fetch at startup,
/// then one validation call per guess received over the guess channel.
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::WordApi;
use crate::game::Game;

/// FetchWorker drives the remote service on behalf of a `Game`.
///
/// Shutdown is cooperative: a message on (or closure of) the shutdown channel
/// ends the loop once the in-flight call, if any, has completed.
pub struct FetchWorker<A> {
    game: Arc<Game>,
    api: A,
    guess_rx: mpsc::Receiver<String>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<A: WordApi> FetchWorker<A> {
    pub fn new(
        game: Arc<Game>,
        api: A,
        guess_rx: mpsc::Receiver<String>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> FetchWorker<A> {
        FetchWorker {
            game,
            api,
            guess_rx,
            shutdown_rx,
        }
    }

    /// Runs until shutdown. Consumed by `tokio::spawn`.
    pub async fn run(mut self) {
        // Without an answer there is no game: a failed fetch is fatal to the
        // session and the worker stops right away.
        match self.api.fetch_answer().await {
            Ok(answer) => {
                info!("Fetched today's answer");
                self.game.mark_initialized(answer).await;
            }
            Err(e) => {
                error!("Error fetching today's answer: {:#}", e);
                self.game
                    .report_error(format!("Could not fetch today's answer: {:#}", e))
                    .await;
                return;
            }
        }

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    debug!("Shutdown requested");
                    break;
                }
                guess = self.guess_rx.recv() => match guess {
                    Some(word) => self.process_guess(word).await,
                    None => {
                        debug!("Guess channel closed");
                        break;
                    }
                },
            }
        }
        info!("Fetch worker stopped");
    }

    /// One remote round trip. Transport and parse failures are reported back
    /// into the game and the worker keeps going; the player can retry.
    async fn process_guess(&self, word: String) {
        info!("Checking guess {}", word);
        match self.api.validate_guess(&word).await {
            Ok(result) => self.game.report_result(result).await,
            Err(e) => {
                warn!("Error checking guess {}: {:#}", word, e);
                self.game
                    .report_error(format!("Could not check {}: {:#}", word, e))
                    .await;
            }
        }
    }
}
