use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::gateway::ActivityData;
use serenity::prelude::Context;
use songbird::events::{Event, EventContext, EventHandler, TrackEvent};
use songbird::input::{ChildContainer, File, Input};
use songbird::tracks::{PlayMode, TrackHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{PlaybackEvent, Radio, Step};

const IDLE_POLL: Duration = Duration::from_secs(10);
const RETRY_BACKOFF: Duration = Duration::from_secs(5);
const LIVENESS_DELAY: Duration = Duration::from_secs(2);

/// Reports the end of one track, once, whether it ended or errored.
#[derive(Clone)]
struct TrackEndNotifier {
    events: mpsc::UnboundedSender<PlaybackEvent>,
    generation: u64,
    fired: Arc<AtomicBool>,
}

impl TrackEndNotifier {
    fn new(events: mpsc::UnboundedSender<PlaybackEvent>, generation: u64) -> Self {
        Self {
            events,
            generation,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sends `Finished` the first time only. Returns whether this call sent it.
    fn notify(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.events.send(PlaybackEvent::Finished {
            generation: self.generation,
        });
        true
    }
}

#[async_trait]
impl EventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        self.notify();
        None
    }
}

/// A track end moves the loop on only if it belongs to the track playing now.
fn is_current_track(current: Option<u64>, finished: u64) -> bool {
    current == Some(finished)
}

/// Drives one voice session until it is replaced, dropped or shut down.
pub async fn run(
    radio: Radio,
    ctx: Context,
    session_id: u64,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
) {
    while let Some(event) = events.recv().await {
        if !radio.lock().await.is_current(session_id) {
            break;
        }

        let result = match event {
            PlaybackEvent::Advance => {
                if radio.is_playing().await {
                    debug!("advance ignored, already playing");
                    Ok(())
                } else {
                    advance(&radio, &ctx, session_id).await
                }
            }
            PlaybackEvent::Finished { generation } => {
                let current = radio
                    .lock()
                    .await
                    .session
                    .as_ref()
                    .map(|s| s.generation);
                if is_current_track(current, generation) {
                    advance(&radio, &ctx, session_id).await
                } else {
                    debug!("stale track end {generation} ignored");
                    Ok(())
                }
            }
            PlaybackEvent::Shutdown => break,
        };

        if let Err(e) = result {
            error!("playback step failed: {e}");
            tokio::time::sleep(RETRY_BACKOFF).await;
            radio.send(PlaybackEvent::Advance).await;
        }
    }
    info!("playback loop for session {session_id} stopped");
}

/// One cycle: runs decision steps until something is playing or the session is gone.
pub async fn advance(radio: &Radio, ctx: &Context, session_id: u64) -> Result<(), crate::Error> {
    loop {
        let step = {
            let mut state = radio.lock().await;
            if !state.is_current(session_id) {
                return Ok(());
            }
            let mut rng = rand::thread_rng();
            state.next_step(&mut rng)
        };

        match step {
            Step::Broadcast => {
                if radio.broadcast_file.exists() {
                    info!("starting daily broadcast");
                    let input = File::new(radio.broadcast_file.clone()).into();
                    play_input(radio, session_id, input).await?;
                    ctx.set_activity(Some(ActivityData::listening(describe(
                        &radio.broadcast_file,
                    ))));
                    return Ok(());
                }
                warn!("{} not found, resuming music", radio.broadcast_file.display());
            }
            Step::Announce(text) => match radio.speech.synthesize(&text).await {
                Ok(path) => {
                    info!("playing announcement");
                    play_input(radio, session_id, File::new(path).into()).await?;
                    return Ok(());
                }
                Err(e) => warn!("announcement dropped, speech failed: {e}"),
            },
            Step::StageBulletin => {
                let text = radio.announcer.compose().await;
                radio.lock().await.stage_announcement(text);
            }
            Step::Wait => {
                debug!("nothing to play, polling again");
                tokio::time::sleep(IDLE_POLL).await;
            }
            Step::Resolve(reference) => {
                info!("processing: {reference}");
                let resolved = radio.resolver.resolve(&reference).await;
                radio.lock().await.record_resolution();

                let Some(resolved) = resolved else {
                    warn!("could not play '{reference}', skipping");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                    continue;
                };

                info!("playing: {} ({})", resolved.title, resolved.backend);
                let input = stream_input(&resolved.stream_url)?;
                let Some(track) = play_input(radio, session_id, input).await? else {
                    return Ok(());
                };

                ctx.set_activity(Some(ActivityData::listening(resolved.title)));

                tokio::time::sleep(LIVENESS_DELAY).await;
                check_liveness(&track).await;
                return Ok(());
            }
        }
    }
}

/// Replaces whatever plays with `input` under a new generation.
async fn play_input(
    radio: &Radio,
    session_id: u64,
    input: Input,
) -> Result<Option<TrackHandle>, crate::Error> {
    let (call, events, generation) = {
        let mut state = radio.lock().await;
        if !state.is_current(session_id) {
            return Ok(None);
        }
        let Some(session) = state.session.as_mut() else {
            return Ok(None);
        };
        session.generation += 1;
        (session.call.clone(), session.events(), session.generation)
    };

    let track = {
        let mut handler = call.lock().await;
        let track = handler.play_only(input.into());

        let notifier = TrackEndNotifier::new(events, generation);
        track.add_event(Event::Track(TrackEvent::End), notifier.clone())?;
        track.add_event(Event::Track(TrackEvent::Error), notifier)?;
        track
    }; // handler lock dropped here

    if let Some(session) = radio.lock().await.session.as_mut() {
        if session.generation == generation {
            session.track = Some(track.clone());
        }
    }
    Ok(Some(track))
}

/// Remote stream through ffmpeg with reconnects enabled, decoded from WAV on stdout.
fn stream_input(url: &str) -> Result<Input, crate::Error> {
    let child = Command::new("ffmpeg")
        .args([
            "-reconnect",
            "1",
            "-reconnect_streamed",
            "1",
            "-reconnect_delay_max",
            "5",
            "-i",
            url,
            "-vn",
            "-f",
            "wav",
            "-ar",
            "48000",
            "-ac",
            "2",
            "-loglevel",
            "error",
            "-",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(ChildContainer::from(child).into())
}

async fn check_liveness(track: &TrackHandle) {
    match track.get_info().await {
        Ok(info) if info.playing != PlayMode::Play => {
            warn!("silence detected, skipping");
            let _ = track.stop();
        }
        Ok(_) => {}
        // already finished; its end event has been sent
        Err(e) => debug!("liveness check: {e}"),
    }
}

fn describe(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_current_generation_advances() {
        assert!(is_current_track(Some(3), 3));
        assert!(!is_current_track(Some(4), 3));
        assert!(!is_current_track(None, 3));
    }

    #[test]
    fn test_end_and_error_report_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = TrackEndNotifier::new(tx, 7);
        let on_error = notifier.clone();

        assert!(notifier.notify());
        assert!(!on_error.notify());

        assert_eq!(rx.try_recv(), Ok(PlaybackEvent::Finished { generation: 7 }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_separate_tracks_report_separately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(TrackEndNotifier::new(tx.clone(), 1).notify());
        assert!(TrackEndNotifier::new(tx, 2).notify());

        assert_eq!(rx.try_recv(), Ok(PlaybackEvent::Finished { generation: 1 }));
        assert_eq!(rx.try_recv(), Ok(PlaybackEvent::Finished { generation: 2 }));
    }

    #[test]
    fn test_describe_uses_file_name() {
        assert_eq!(describe(Path::new("/srv/radio/deutschland.m4a")), "deutschland.m4a");
    }
}
