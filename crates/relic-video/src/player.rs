//! Cooperative movie playback
//!
//! [`Player`] runs a [`Decoder`] on a tokio task, hands every published
//! frame to a [`FrameSink`] and sleeps for the frame delay. Stopping is
//! cooperative: the task checks the stop request before each packet, so a
//! packet being decoded always completes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::decoder::{Decoder, Step};
use crate::error::VideoError;
use crate::frame::Frame;

/// Receiver of published frames
pub trait FrameSink: Send + 'static {
    /// Display `frame`, the `index`th frame of the movie
    fn publish(&mut self, frame: &Frame, index: usize);
}

impl FrameSink for mpsc::UnboundedSender<Frame> {
    fn publish(&mut self, frame: &Frame, index: usize) {
        if self.send(frame.clone()).is_err() {
            trace!("Frame {} dropped: receiver closed", index);
        }
    }
}

/// Playback timing options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Sleep between frames
    pub realtime: bool,
    /// Delay to use instead of the stream's own
    pub delay_override: Option<Duration>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            realtime: true,
            delay_override: None,
        }
    }
}

impl PlaybackConfig {
    /// Set whether to sleep between frames
    #[must_use]
    pub const fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Replace the stream's frame delay
    #[must_use]
    pub const fn with_delay_override(mut self, delay: Duration) -> Self {
        self.delay_override = Some(delay);
        self
    }

    /// Delay to sleep after a frame the stream wants shown for `stream_delay`
    pub fn frame_delay(&self, stream_delay: Duration) -> Duration {
        if self.realtime {
            self.delay_override.unwrap_or(stream_delay)
        } else {
            Duration::ZERO
        }
    }
}

/// How a playback session ended
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackSummary {
    /// Frames handed to the sink
    pub frames: usize,
    /// Whether a stop request ended playback
    pub stopped: bool,
    /// Decode error that ended playback, if any
    pub error: Option<VideoError>,
}

#[derive(Debug, Default)]
struct Flags {
    playing: bool,
    stopping: bool,
}

/// Plays one movie at a time on a background task
#[derive(Debug)]
pub struct Player {
    config: PlaybackConfig,
    flags: Arc<RwLock<Flags>>,
    handle: Option<JoinHandle<PlaybackSummary>>,
}

impl Player {
    /// Player with the given timing options
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            flags: Arc::new(RwLock::new(Flags::default())),
            handle: None,
        }
    }

    /// Whether a session is running
    pub fn is_playing(&self) -> bool {
        self.flags.read().playing
    }

    /// Start playing `decoder` into `sink`
    ///
    /// Returns `false` without doing anything when a session is already
    /// running. Must be called from within a tokio runtime.
    pub fn play<S: FrameSink>(&mut self, mut decoder: Decoder, mut sink: S) -> bool {
        {
            let mut flags = self.flags.write();
            if flags.playing {
                return false;
            }
            flags.playing = true;
            flags.stopping = false;
        }

        let flags = Arc::clone(&self.flags);
        let config = self.config.clone();
        self.handle = Some(tokio::spawn(async move {
            info!("Playback started");
            let mut summary = PlaybackSummary::default();
            loop {
                if flags.read().stopping {
                    summary.stopped = true;
                    break;
                }
                match decoder.step() {
                    Ok(Step::Continue) => {}
                    Ok(Step::Frame(delay)) => {
                        if let Some(frame) = decoder.frame() {
                            sink.publish(frame, summary.frames);
                            summary.frames += 1;
                        }
                        let delay = config.frame_delay(delay);
                        if delay.is_zero() {
                            tokio::task::yield_now().await;
                        } else {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    Ok(Step::End) => break,
                    Err(e) => {
                        warn!("Playback stopped: {}", e);
                        summary.error = Some(e);
                        break;
                    }
                }
            }

            {
                let mut flags = flags.write();
                flags.playing = false;
                flags.stopping = false;
            }
            info!(
                "Playback finished after {} frames{}",
                summary.frames,
                if summary.stopped { " (stopped)" } else { "" }
            );
            summary
        }));
        true
    }

    /// Ask the running session to stop after its current packet
    pub fn stop(&self) {
        let mut flags = self.flags.write();
        if flags.playing {
            debug!("Stop requested");
            flags.stopping = true;
        }
    }

    /// Wait for the current session to end
    ///
    /// Returns `None` when nothing was started or the task panicked.
    pub async fn wait(&mut self) -> Option<PlaybackSummary> {
        let handle = self.handle.take()?;
        handle.await.ok()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}
