//! Operator checkpoints
//!
//! A run pauses twice: before the first automated action (the operator logs
//! in to the portal by hand) and before the browser is closed (the operator
//! inspects the final state). The coordinator only sees [`OperatorSignal`];
//! how the operator answers is up to the implementation.

use crate::config::{CheckpointConfig, CheckpointMode};
use crate::domain::{HarvestError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// External synchronization with the operator
#[async_trait]
pub trait OperatorSignal: Send + Sync {
    /// Blocks until the operator says automation may start
    async fn wait_ready(&self) -> Result<()>;

    /// Blocks until the operator says the browser may be closed
    async fn wait_finish(&self) -> Result<()>;
}

/// Waits for a line on standard input
pub struct PromptSignal;

impl PromptSignal {
    async fn prompt(message: &str) -> Result<()> {
        println!("{message}");
        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| HarvestError::Signal(format!("Failed to read from stdin: {e}")))?;
        if read == 0 {
            tracing::warn!("Standard input closed, continuing without operator confirmation");
        }
        Ok(())
    }
}

#[async_trait]
impl OperatorSignal for PromptSignal {
    async fn wait_ready(&self) -> Result<()> {
        Self::prompt("Log in to the portal in the browser window, then press Enter to start...")
            .await
    }

    async fn wait_finish(&self) -> Result<()> {
        Self::prompt("Run finished. Press Enter to close the browser...").await
    }
}

/// Waits for a touch file to appear, then removes it
pub struct FileSignal {
    ready_file: PathBuf,
    finish_file: PathBuf,
    poll: Duration,
}

impl FileSignal {
    pub fn new(ready_file: PathBuf, finish_file: PathBuf, poll: Duration) -> Self {
        Self {
            ready_file,
            finish_file,
            poll,
        }
    }

    async fn await_file(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Waiting for operator signal file");
        loop {
            let exists = tokio::fs::try_exists(path)
                .await
                .map_err(|e| HarvestError::Signal(format!("{}: {e}", path.display())))?;
            if exists {
                break;
            }
            tokio::time::sleep(self.poll).await;
        }

        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Could not consume signal file");
        }
        tracing::info!(path = %path.display(), "Operator signal received");
        Ok(())
    }
}

#[async_trait]
impl OperatorSignal for FileSignal {
    async fn wait_ready(&self) -> Result<()> {
        self.await_file(&self.ready_file).await
    }

    async fn wait_finish(&self) -> Result<()> {
        self.await_file(&self.finish_file).await
    }
}

/// Never waits
pub struct NoSignal;

#[async_trait]
impl OperatorSignal for NoSignal {
    async fn wait_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn wait_finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds the signal the configuration asks for
pub fn signal_for(config: &CheckpointConfig) -> Box<dyn OperatorSignal> {
    match config.mode {
        CheckpointMode::Prompt => Box::new(PromptSignal),
        CheckpointMode::File => Box::new(FileSignal::new(
            config.ready_file.clone(),
            config.finish_file.clone(),
            Duration::from_millis(config.poll_interval_ms),
        )),
        CheckpointMode::None => Box::new(NoSignal),
    }
}
