use std::sync::Mutex;

use async_trait::async_trait;
use radio_bot::radio::vote::{
    self, Ballot, VoteError, VoteFlag, VoteOutcome, ADD_EMOJI, SKIP_EMOJI, VOTE_WINDOW,
};
use radio_bot::Error;

/// Chat stand-in: `raw` reactions including the bot's own seed.
struct MockBallot {
    raw: usize,
    fail_count: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockBallot {
    fn with_reactions(raw: usize) -> Self {
        Self {
            raw,
            fail_count: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ballot for MockBallot {
    async fn open(&self, prompt: &str, _emoji: &str) -> Result<(), Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(())
    }

    async fn count(&self, _emoji: &str) -> Result<usize, Error> {
        if self.fail_count {
            return Err("message deleted".into());
        }
        Ok(self.raw)
    }
}

fn prompt(required: usize) -> String {
    format!("Benötigt: {required}")
}

#[tokio::test(start_paused = true)]
async fn test_lone_listener_needs_no_vote() {
    let flag = VoteFlag::default();
    let ballot = MockBallot::with_reactions(0);

    let outcome = vote::conduct(&flag, &ballot, 1, SKIP_EMOJI, prompt, VOTE_WINDOW)
        .await
        .unwrap();

    assert_eq!(outcome, VoteOutcome::Immediate);
    assert!(ballot.prompts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_three_listeners_need_two_votes() {
    let flag = VoteFlag::default();

    // bot seed + 2 listeners
    let ballot = MockBallot::with_reactions(3);
    let outcome = vote::conduct(&flag, &ballot, 3, ADD_EMOJI, prompt, VOTE_WINDOW)
        .await
        .unwrap();
    assert_eq!(outcome, VoteOutcome::Passed { count: 2, required: 2 });
    assert_eq!(ballot.prompts(), ["Benötigt: 2"]);

    // bot seed + 1 listener
    let ballot = MockBallot::with_reactions(2);
    let outcome = vote::conduct(&flag, &ballot, 3, ADD_EMOJI, prompt, VOTE_WINDOW)
        .await
        .unwrap();
    assert_eq!(outcome, VoteOutcome::Failed { count: 1, required: 2 });
    assert!(!outcome.approved());
    assert!(!flag.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_vote_waits_full_window() {
    let flag = VoteFlag::default();
    let ballot = MockBallot::with_reactions(2);
    let started = tokio::time::Instant::now();

    vote::conduct(&flag, &ballot, 2, SKIP_EMOJI, prompt, VOTE_WINDOW)
        .await
        .unwrap();

    assert!(started.elapsed() >= VOTE_WINDOW);
}

#[tokio::test(start_paused = true)]
async fn test_second_vote_is_rejected_while_one_runs() {
    let flag = VoteFlag::default();
    let first = MockBallot::with_reactions(2);
    let second = MockBallot::with_reactions(2);

    let (a, b) = tokio::join!(
        vote::conduct(&flag, &first, 2, SKIP_EMOJI, prompt, VOTE_WINDOW),
        vote::conduct(&flag, &second, 2, ADD_EMOJI, prompt, VOTE_WINDOW),
    );

    assert_eq!(a.unwrap(), VoteOutcome::Passed { count: 1, required: 1 });
    assert!(matches!(b, Err(VoteError::AlreadyActive)));
    assert!(second.prompts().is_empty());
    assert!(!flag.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_flag_cleared_after_ballot_error() {
    let flag = VoteFlag::default();
    let ballot = MockBallot {
        raw: 0,
        fail_count: true,
        prompts: Mutex::new(Vec::new()),
    };

    let result = vote::conduct(&flag, &ballot, 4, SKIP_EMOJI, prompt, VOTE_WINDOW).await;

    assert!(matches!(result, Err(VoteError::Ballot(_))));
    assert!(!flag.is_active());
    assert!(flag.try_begin().is_some());
}
