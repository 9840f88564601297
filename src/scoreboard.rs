/// Flat-file high score storage. Scores are kept as a single JSON array on
/// disk and rewritten whole on every append; the file is small enough that
/// anything fancier would be noise.
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};

/// One finished game on the scoreboard.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: i64,
}

pub struct Scoreboard {
    path: PathBuf,
}

impl Scoreboard {
    pub fn new(path: impl Into<PathBuf>) -> Scoreboard {
        Scoreboard { path: path.into() }
    }

    /// All recorded scores, in insertion order. A missing file is an empty
    /// board, not an error.
    pub async fn scores(&self) -> Result<Vec<ScoreEntry>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).context(format!("Error opening {}", self.path.display()));
            }
        };

        let mut contents = vec![];
        file.read_to_end(&mut contents)
            .await
            .context(format!("Error reading {}", self.path.display()))?;

        serde_json::from_slice(&contents)
            .context(format!("Error deserializing scores from {}", self.path.display()))
    }

    /// Appends one entry and rewrites the file.
    pub async fn add_score(&self, name: impl Into<String>, score: i64) -> Result<()> {
        let mut scores = self.scores().await?;
        scores.push(ScoreEntry {
            name: name.into(),
            score,
        });

        let mut file = File::create(&self.path)
            .await
            .context(format!("Error creating {}", self.path.display()))?;
        file.write_all(
            serde_json::to_vec_pretty(&scores)
                .context("Error serializing scores")?
                .as_ref(),
        )
        .await
        .context(format!("Error writing {}", self.path.display()))
    }

    /// Scores sorted best-first for display.
    pub async fn top_scores(&self) -> Result<Vec<ScoreEntry>> {
        let mut scores = self.scores().await?;
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(scores)
    }
}
