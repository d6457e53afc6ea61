use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
#[error("playlist file {path}: {source}")]
pub struct PlaylistError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Where a pick came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pick {
    Pending(String),
    Random(String),
}

impl Pick {
    pub fn into_reference(self) -> String {
        match self {
            Self::Pending(r) | Self::Random(r) => r,
        }
    }
}

/// Permanent playlist backed by a line-per-entry file, plus the transient pending queue.
///
/// The file is always written before memory is touched, so a failed write
/// leaves both sides as they were.
pub struct PlaylistStore {
    path: PathBuf,
    entries: Vec<String>,
    pending: VecDeque<String>,
    last_played: Option<String>,
}

impl PlaylistStore {
    /// Reads the backing file, creating it when missing. Unreadable files give an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if !path.exists() {
            if let Err(e) = std::fs::write(&path, "") {
                warn!("could not create playlist file {}: {e}", path.display());
            }
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) => {
                warn!("could not read playlist file {}: {e}", path.display());
                Vec::new()
            }
        };

        Self {
            path,
            entries,
            pending: VecDeque::new(),
            last_played: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn pending(&self) -> impl Iterator<Item = &String> {
        self.pending.iter()
    }

    pub fn last_played(&self) -> Option<&str> {
        self.last_played.as_deref()
    }

    /// Appends one entry. Line breaks inside it are folded into spaces so it
    /// stays one line; a blank entry is ignored.
    pub fn add(&mut self, entry: &str) -> Result<usize, PlaylistError> {
        let entry = single_line(entry);
        if entry.is_empty() {
            return Ok(self.entries.len());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        write!(file, "\n{entry}").map_err(|e| self.io_error(e))?;

        self.entries.push(entry);
        Ok(self.entries.len())
    }

    /// Drops every entry containing `needle`, ignoring case. Returns how many went.
    pub fn remove(&mut self, needle: &str) -> Result<usize, PlaylistError> {
        let needle = needle.to_lowercase();
        let kept: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        let content: String = kept.iter().map(|e| format!("{e}\n")).collect();
        std::fs::write(&self.path, content).map_err(|e| self.io_error(e))?;

        let removed = self.entries.len() - kept.len();
        self.entries = kept;
        Ok(removed)
    }

    pub fn push_front(&mut self, reference: String) {
        self.pending.push_front(reference);
    }

    /// Pending queue first, then a random permanent entry that differs from the previous pick.
    pub fn next_for_playback<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Pick> {
        if let Some(reference) = self.pending.pop_front() {
            self.last_played = Some(reference.clone());
            return Some(Pick::Pending(reference));
        }

        let mut choices: Vec<&String> = self.entries.iter().collect();
        if choices.len() > 1 {
            if let Some(last) = &self.last_played {
                let fresh: Vec<&String> = choices.iter().copied().filter(|c| *c != last).collect();
                // every entry equal to the last pick: nothing to avoid
                if !fresh.is_empty() {
                    choices = fresh;
                }
            }
        }

        let pick = choices.choose(rng).map(|c| (*c).clone())?;
        self.last_played = Some(pick.clone());
        Some(Pick::Random(pick))
    }

    fn io_error(&self, source: std::io::Error) -> PlaylistError {
        PlaylistError {
            path: self.path.clone(),
            source,
        }
    }
}

fn single_line(entry: &str) -> String {
    entry
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
