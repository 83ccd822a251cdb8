//! Computer opponent over the UCI protocol
//!
//! Each computer game owns one engine process, spawned when the game is
//! created and configured once with the skill level derived from the
//! game's ELO. Deleting the game sends `quit`; the process is killed if
//! it is still running when the engine is dropped.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Install locations checked when no engine path is configured
const ENGINE_CANDIDATES: &[&str] = &[
    "/opt/homebrew/bin/stockfish",
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/usr/games/stockfish",
];

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Slack on top of the requested think time before a search is abandoned
const SEARCH_GRACE: Duration = Duration::from_secs(5);
/// How long a stopped search may take to report its `bestmove`
const STOP_GRACE: Duration = Duration::from_secs(2);
const QUIT_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start engine {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine closed its output")]
    Closed,

    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Engine ignored stop after a timed out search")]
    Unresponsive,
}

impl EngineError {
    /// The engine can no longer be trusted to answer in step
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::Timeout(_))
    }
}

/// A running engine bound to one game
#[async_trait]
pub trait Engine: Send + Sync {
    /// Best move for the position in FEN, in UCI notation.
    /// `None` when the side to move has no legal move.
    async fn best_move(&mut self, fen: &str) -> Result<Option<String>, EngineError>;

    /// Ask the engine to shut down
    async fn quit(&mut self) -> Result<(), EngineError>;
}

/// Spawns engines for new computer games
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn spawn(&self, skill_level: u8) -> Result<Box<dyn Engine>, EngineError>;
}

/// Pick the configured engine binary, or the first candidate that exists
pub fn resolve_engine_path(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    ENGINE_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("stockfish"))
}

/// Extract the move from a `bestmove` line
pub fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "bestmove" {
        return None;
    }
    match parts.next() {
        Some("(none)") | Some("0000") | None => Some(None),
        Some(mv) => Some(Some(mv.to_string())),
    }
}

pub struct StockfishFactory {
    path: PathBuf,
    move_time: Duration,
}

impl StockfishFactory {
    pub fn new(path: PathBuf, move_time: Duration) -> Self {
        Self { path, move_time }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_shared(self) -> Arc<dyn EngineFactory> {
        Arc::new(self)
    }
}

#[async_trait]
impl EngineFactory for StockfishFactory {
    async fn spawn(&self, skill_level: u8) -> Result<Box<dyn Engine>, EngineError> {
        let engine = UciEngine::start(&self.path, skill_level, self.move_time).await?;
        Ok(Box::new(engine))
    }
}

/// Engine process speaking UCI over stdin/stdout
pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    move_time: Duration,
    search_grace: Duration,
}

impl UciEngine {
    pub async fn start(
        path: &Path,
        skill_level: u8,
        move_time: Duration,
    ) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = child.stdout.take().ok_or(EngineError::Closed)?;

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            move_time,
            search_grace: SEARCH_GRACE,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok", HANDSHAKE_TIMEOUT).await?;
        engine
            .send(&format!("setoption name Skill Level value {}", skill_level))
            .await?;
        engine.send("isready").await?;
        engine.wait_for("readyok", HANDSHAKE_TIMEOUT).await?;

        tracing::info!(
            "[ENGINE] Started {} with skill level {}",
            path.display(),
            skill_level
        );
        Ok(engine)
    }

    /// Slack allowed on top of the think time before a search is stopped
    pub fn with_search_grace(mut self, grace: Duration) -> Self {
        self.search_grace = grace;
        self
    }

    async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        tracing::trace!("[ENGINE] > {}", command);
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> Result<String, EngineError> {
        let line = self.stdout.next_line().await?.ok_or(EngineError::Closed)?;
        tracing::trace!("[ENGINE] < {}", line);
        Ok(line)
    }

    async fn wait_for(&mut self, token: &str, limit: Duration) -> Result<(), EngineError> {
        let wait = async {
            loop {
                if self.next_line().await?.trim() == token {
                    return Ok::<(), EngineError>(());
                }
            }
        };
        tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| EngineError::Timeout(limit))?
    }

    async fn read_bestmove(&mut self) -> Result<Option<String>, EngineError> {
        loop {
            let line = self.next_line().await?;
            if let Some(best) = parse_bestmove(&line) {
                return Ok(best);
            }
        }
    }
}

#[async_trait]
impl Engine for UciEngine {
    async fn best_move(&mut self, fen: &str) -> Result<Option<String>, EngineError> {
        self.send(&format!("position fen {}", fen)).await?;
        self.send(&format!("go movetime {}", self.move_time.as_millis()))
            .await?;

        let limit = self.move_time + self.search_grace;
        if let Ok(answer) = tokio::time::timeout(limit, self.read_bestmove()).await {
            return answer;
        }

        // Every `go` yields exactly one `bestmove`. Consume the late one so
        // the next search does not read it as its own answer.
        tracing::warn!("[ENGINE] No bestmove after {:?}, stopping search", limit);
        self.send("stop").await?;
        match tokio::time::timeout(STOP_GRACE, self.read_bestmove()).await {
            Ok(Ok(stale)) => {
                tracing::debug!("[ENGINE] Discarded late bestmove {:?}", stale);
                Err(EngineError::Timeout(limit))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(EngineError::Unresponsive),
        }
    }

    async fn quit(&mut self) -> Result<(), EngineError> {
        self.send("quit").await?;
        if tokio::time::timeout(QUIT_GRACE, self.child.wait()).await.is_err() {
            tracing::warn!("[ENGINE] Engine did not exit after quit, killing it");
            self.child.kill().await?;
        }
        Ok(())
    }
}
