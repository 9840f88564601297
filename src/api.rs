/// Client for the remote Wordle service. The service exposes two operations:
/// `GET /answer` returns today's answer, and `POST /<guess>` checks a guess
/// against the dictionary and scores it letter by letter.
///
/// The fetch worker talks to the service through the `WordApi` trait so tests
/// can swap in a scripted fake without any network.
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::game::{GuessResult, LetterState, WORD_LENGTH};

/// Host of the public Wordle API service.
pub const DEFAULT_API_HOST: &str = "wordle-api-kappa.vercel.app";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The remote collaborator as the worker sees it: fetch the daily answer
/// once, then validate guesses one at a time.
#[async_trait]
pub trait WordApi: Send + Sync {
    async fn fetch_answer(&self) -> Result<String>;
    async fn validate_guess(&self, word: &str) -> Result<GuessResult>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerResponse {
    pub(crate) word: String,
}

/// Wire shape of the guess endpoint. `character_info` is null for words the
/// dictionary rejects and for the winning guess.
#[derive(Debug, Deserialize)]
pub(crate) struct GuessResponse {
    guess: String,
    is_word_in_list: bool,
    is_correct: bool,
    character_info: Option<Vec<CharacterInfo>>,
}

#[derive(Debug, Deserialize)]
struct CharacterInfo {
    #[serde(rename = "char")]
    letter: String,
    scoring: CharacterScoring,
}

#[derive(Debug, Deserialize)]
struct CharacterScoring {
    in_word: bool,
    correct_idx: bool,
}

impl GuessResponse {
    /// Converts the wire payload into a `GuessResult` the game can record.
    ///
    /// A winning guess gets all-correct letter states synthesized locally,
    /// since the service omits the per-letter scoring for it. An invalid word
    /// carries no letter states at all; it never reaches the history.
    pub(crate) fn into_result(self) -> Result<GuessResult> {
        let word = self.guess.to_uppercase();

        let letter_states = if !self.is_word_in_list {
            Vec::new()
        } else if self.is_correct {
            word.chars()
                .map(|letter| LetterState {
                    letter,
                    in_word: true,
                    correct_position: true,
                })
                .collect()
        } else {
            let info = self
                .character_info
                .with_context(|| format!("No per-letter scoring for guess {}", word))?;
            if info.len() != WORD_LENGTH {
                bail!(
                    "Expected {} per-letter scores for guess {}, got {}",
                    WORD_LENGTH,
                    word,
                    info.len()
                );
            }
            info.into_iter()
                .map(|entry| {
                    let letter = entry
                        .letter
                        .chars()
                        .next()
                        .with_context(|| format!("Empty character entry for guess {}", word))?
                        .to_ascii_uppercase();
                    Ok(LetterState {
                        letter,
                        in_word: entry.scoring.in_word,
                        correct_position: entry.scoring.correct_idx,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(GuessResult {
            word,
            is_valid_word: self.is_word_in_list,
            is_correct: self.is_correct,
            letter_states,
        })
    }
}

/// HTTP implementation of `WordApi` against the public service.
pub struct WordleApi {
    client: reqwest::Client,
    base_url: String,
}

impl WordleApi {
    /// `new` builds a client for the given host with a bounded request
    /// timeout, so a hung service surfaces as a reportable error instead of
    /// blocking the worker forever.
    pub fn new(host: impl Into<String>) -> Result<WordleApi> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Error building HTTP client")?;
        Ok(WordleApi {
            client,
            base_url: format!("https://{}", host.into()),
        })
    }
}

#[async_trait]
impl WordApi for WordleApi {
    async fn fetch_answer(&self) -> Result<String> {
        let url = format!("{}/answer", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Error fetching today's answer")?
            .error_for_status()
            .context("Answer request rejected by the service")?;

        let answer: AnswerResponse = response
            .json()
            .await
            .context("Error parsing answer response")?;
        Ok(answer.word.to_uppercase())
    }

    async fn validate_guess(&self, word: &str) -> Result<GuessResult> {
        let url = format!("{}/{}", self.base_url, word.to_lowercase());
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .with_context(|| format!("Error sending guess {}", word))?
            .error_for_status()
            .with_context(|| format!("Guess {} rejected by the service", word))?;

        let payload: GuessResponse = response
            .json()
            .await
            .with_context(|| format!("Error parsing response for guess {}", word))?;
        payload.into_result()
    }
}
