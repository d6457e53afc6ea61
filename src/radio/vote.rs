use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

pub const VOTE_WINDOW: Duration = Duration::from_secs(60);
pub const SKIP_EMOJI: &str = "⏭️";
pub const ADD_EMOJI: &str = "👍";

/// Process-wide "a vote is running" flag. It holds the token of the running
/// vote, 0 when idle. A [`VoteGuard`] only clears the flag while its own token
/// is still the active one.
#[derive(Clone, Default)]
pub struct VoteFlag {
    active: Arc<AtomicU64>,
    issued: Arc<AtomicU64>,
}

impl VoteFlag {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }

    pub fn try_begin(&self) -> Option<VoteGuard> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.active
            .compare_exchange(0, token, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| VoteGuard {
                active: self.active.clone(),
                token,
            })
    }

    /// Safety valve used when the pending queue is consumed.
    pub fn reset(&self) {
        self.active.store(0, Ordering::SeqCst);
    }
}

pub struct VoteGuard {
    active: Arc<AtomicU64>,
    token: u64,
}

impl Drop for VoteGuard {
    fn drop(&mut self) {
        let _ = self
            .active
            .compare_exchange(self.token, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("a vote is already running")]
    AlreadyActive,
    #[error("vote message failed: {0}")]
    Ballot(#[source] crate::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Fewer than two eligible voters; no vote held.
    Immediate,
    Passed { count: usize, required: usize },
    Failed { count: usize, required: usize },
}

impl VoteOutcome {
    pub fn approved(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Votes needed for `eligible` non-bot listeners; `None` when no vote is held.
pub fn required_votes(eligible: usize) -> Option<usize> {
    (eligible >= 2).then(|| eligible.div_ceil(2))
}

/// The chat side of a vote: one message with one reaction.
#[async_trait]
pub trait Ballot: Send + Sync {
    async fn open(&self, prompt: &str, emoji: &str) -> Result<(), crate::Error>;

    /// Raw reaction count for `emoji`, the bot's own seed reaction included.
    async fn count(&self, emoji: &str) -> Result<usize, crate::Error>;
}

/// Runs one vote: post, wait the whole window, count once.
pub async fn conduct<B: Ballot + ?Sized>(
    flag: &VoteFlag,
    ballot: &B,
    eligible: usize,
    emoji: &str,
    prompt: impl FnOnce(usize) -> String,
    window: Duration,
) -> Result<VoteOutcome, VoteError> {
    let Some(required) = required_votes(eligible) else {
        return Ok(VoteOutcome::Immediate);
    };

    let _guard = flag.try_begin().ok_or(VoteError::AlreadyActive)?;

    ballot
        .open(&prompt(required), emoji)
        .await
        .map_err(VoteError::Ballot)?;

    tokio::time::sleep(window).await;

    let count = match ballot.count(emoji).await {
        Ok(raw) => raw.saturating_sub(1),
        Err(e) => {
            warn!("vote count failed: {e}");
            return Err(VoteError::Ballot(e));
        }
    };

    info!("vote closed: {count}/{required}");
    Ok(if count >= required {
        VoteOutcome::Passed { count, required }
    } else {
        VoteOutcome::Failed { count, required }
    })
}
