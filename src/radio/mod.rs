pub mod announce;
pub mod broadcast;
pub mod player;
pub mod playlist;
pub mod resolver;
pub mod speech;
pub mod vote;

use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use serenity::model::id::{ChannelId, GuildId};
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::Call;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{debug, info};

use announce::Announcer;
use playlist::{Pick, PlaylistStore};
use resolver::StreamResolver;
use speech::SpeechSynthesizer;
use vote::VoteFlag;

/// A bulletin is staged whenever the song counter reaches a positive multiple of this.
pub const BULLETIN_EVERY: u64 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Play something if nothing is playing.
    Advance,
    /// The track started as `generation` ended or failed.
    Finished { generation: u64 },
    Shutdown,
}

/// One pass of the playback decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Broadcast,
    Announce(String),
    StageBulletin,
    Wait,
    Resolve(String),
}

/// Everything tied to one voice connection.
pub struct Session {
    pub id: u64,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub call: Arc<Mutex<Call>>,
    pub track: Option<TrackHandle>,
    pub generation: u64,
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

impl Session {
    pub fn send(&self, event: PlaybackEvent) {
        if self.events.send(event).is_err() {
            debug!("playback loop gone, dropped {event:?}");
        }
    }

    pub fn events(&self) -> mpsc::UnboundedSender<PlaybackEvent> {
        self.events.clone()
    }
}

pub struct RadioState {
    pub playlist: PlaylistStore,
    pub song_counter: u64,
    pub pending_announcement: Option<String>,
    pub pending_broadcast: bool,
    pub session: Option<Session>,
    votes: VoteFlag,
    next_session_id: u64,
}

impl RadioState {
    pub fn new(playlist: PlaylistStore, votes: VoteFlag) -> Self {
        Self {
            playlist,
            song_counter: 0,
            pending_announcement: None,
            pending_broadcast: false,
            session: None,
            votes,
            next_session_id: 0,
        }
    }

    /// Staged broadcast, pending announcement, the periodic bulletin, then the next song.
    pub fn next_step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Step {
        if std::mem::take(&mut self.pending_broadcast) {
            return Step::Broadcast;
        }

        if let Some(text) = self.pending_announcement.take() {
            return Step::Announce(text);
        }

        if self.song_counter > 0 && self.song_counter % BULLETIN_EVERY == 0 {
            self.song_counter += 1;
            return Step::StageBulletin;
        }

        match self.playlist.next_for_playback(rng) {
            Some(Pick::Pending(reference)) => {
                self.votes.reset();
                Step::Resolve(reference)
            }
            Some(Pick::Random(reference)) => Step::Resolve(reference),
            None => Step::Wait,
        }
    }

    /// Counted whether or not the reference resolved, so a broken entry cannot stall the loop.
    pub fn record_resolution(&mut self) {
        self.song_counter += 1;
    }

    pub fn stage_announcement(&mut self, text: String) {
        self.pending_announcement = Some(text);
    }

    pub fn stage_broadcast(&mut self) {
        self.pending_broadcast = true;
    }

    pub fn is_current(&self, session_id: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == session_id)
    }
}

#[derive(Clone)]
pub struct Radio {
    state: Arc<Mutex<RadioState>>,
    pub resolver: Arc<StreamResolver>,
    pub announcer: Arc<Announcer>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub votes: VoteFlag,
    pub broadcast_file: PathBuf,
}

impl Radio {
    pub fn new(
        playlist: PlaylistStore,
        resolver: StreamResolver,
        announcer: Announcer,
        speech: Arc<dyn SpeechSynthesizer>,
        broadcast_file: PathBuf,
    ) -> Self {
        let votes = VoteFlag::default();
        Self {
            state: Arc::new(Mutex::new(RadioState::new(playlist, votes.clone()))),
            resolver: Arc::new(resolver),
            announcer: Arc::new(announcer),
            speech,
            votes,
            broadcast_file,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, RadioState> {
        self.state.lock().await
    }

    /// Binds the radio to a fresh voice connection and starts its playback loop.
    pub async fn start_session(
        &self,
        ctx: serenity::prelude::Context,
        guild_id: GuildId,
        channel_id: ChannelId,
        call: Arc<Mutex<Call>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = {
            let mut state = self.lock().await;
            if let Some(old) = state.session.take() {
                old.send(PlaybackEvent::Shutdown);
            }
            state.next_session_id += 1;
            let id = state.next_session_id;
            state.session = Some(Session {
                id,
                guild_id,
                channel_id,
                call,
                track: None,
                generation: 0,
                events: tx.clone(),
            });
            id
        };

        info!("session {session_id} started in channel {channel_id}");
        tokio::spawn(player::run(self.clone(), ctx, session_id, rx));
        let _ = tx.send(PlaybackEvent::Advance);
    }

    /// Joins `channel_id` self-deafened and starts a session there.
    pub async fn connect(
        &self,
        ctx: &serenity::prelude::Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), crate::Error> {
        let manager = songbird::get(ctx)
            .await
            .ok_or("songbird is not registered")?;

        let call = manager.join(guild_id, channel_id).await?;
        {
            let mut handler = call.lock().await;
            if let Err(e) = handler.deafen(true).await {
                debug!("could not self-deafen: {e}");
            }
        }

        self.start_session(ctx.clone(), guild_id, channel_id, call)
            .await;
        Ok(())
    }

    pub async fn end_session(&self) {
        let session = self.lock().await.session.take();
        if let Some(session) = session {
            if let Some(track) = &session.track {
                let _ = track.stop();
            }
            session.send(PlaybackEvent::Shutdown);
            info!("session {} ended", session.id);
        }
    }

    pub async fn send(&self, event: PlaybackEvent) -> bool {
        match &self.lock().await.session {
            Some(session) => {
                session.send(event);
                true
            }
            None => false,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.lock().await.session.is_some()
    }

    pub async fn channel(&self) -> Option<ChannelId> {
        self.lock().await.session.as_ref().map(|s| s.channel_id)
    }

    pub async fn set_channel(&self, channel_id: ChannelId) {
        if let Some(session) = self.lock().await.session.as_mut() {
            session.channel_id = channel_id;
        }
    }

    pub async fn is_playing(&self) -> bool {
        let track = self
            .lock()
            .await
            .session
            .as_ref()
            .and_then(|s| s.track.clone());
        match track {
            Some(t) => t
                .get_info()
                .await
                .map(|info| info.playing == PlayMode::Play)
                .unwrap_or(false),
            None => false,
        }
    }

    /// Stops the current track; its end event moves the loop on.
    pub async fn stop_current(&self) -> bool {
        let track = self
            .lock()
            .await
            .session
            .as_ref()
            .and_then(|s| s.track.clone());
        match track {
            Some(t) => t.stop().is_ok(),
            None => false,
        }
    }

    /// Puts `reference` at the head of the pending queue and starts playback when idle.
    pub async fn play_next(&self, reference: String) {
        self.lock().await.playlist.push_front(reference);
        if !self.is_playing().await {
            self.send(PlaybackEvent::Advance).await;
        }
    }

    /// Queues a bulletin for the next cycle and makes that cycle happen now.
    pub async fn announce_now(&self, text: String) {
        self.lock().await.stage_announcement(text);
        self.interrupt().await;
    }

    /// Stages the daily broadcast ahead of everything else. A cycle that is
    /// idling or backing off picks it up on its next step.
    pub async fn start_broadcast(&self) {
        self.lock().await.stage_broadcast();
        self.interrupt().await;
    }

    /// Ends the current track so its end event runs the next cycle, or kicks an idle loop.
    async fn interrupt(&self) {
        if self.is_playing().await {
            self.stop_current().await;
        } else {
            self.send(PlaybackEvent::Advance).await;
        }
    }
}
