//! Audio deck: a playback queue driving one audio sink

use serde::Serialize;

use crate::domain::track::Track;

pub mod error;
pub mod queue;
pub mod sink;

use error::DeckError;
use queue::PlayQueue;
use sink::AudioSink;

pub struct Deck {
    queue: Option<PlayQueue>,
    shuffle: bool,
    playing: bool,
    volume: f32,
    sink: Box<dyn AudioSink>,
}

/// Snapshot of the deck for display
#[derive(Debug, Clone, Serialize)]
pub struct DeckState {
    pub current: Option<Track>,
    pub index: usize,
    pub queue_len: usize,
    pub playing: bool,
    pub shuffle: bool,
    pub volume: f32,
}

impl Deck {
    pub fn new(sink: Box<dyn AudioSink>, volume: f32) -> Self {
        Self {
            queue: None,
            shuffle: false,
            playing: false,
            volume: volume.clamp(0.0, 1.0),
            sink,
        }
    }

    pub fn state(&self) -> DeckState {
        DeckState {
            current: self.current().cloned(),
            index: self.queue.as_ref().map(PlayQueue::index).unwrap_or(0),
            queue_len: self.queue.as_ref().map(PlayQueue::len).unwrap_or(0),
            playing: self.playing,
            shuffle: self.shuffle,
            volume: self.volume,
        }
    }

    pub fn current(&self) -> Option<&Track> {
        self.queue.as_ref().map(PlayQueue::current)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Replaces the queue and starts its first track.
    pub fn start(&mut self, tracks: Vec<Track>) -> Result<&Track, DeckError> {
        let queue = PlayQueue::new(tracks)?;
        log::info!("deck: new queue of {} tracks", queue.len());
        self.queue = Some(queue);
        self.load_current();
        self.current().ok_or(DeckError::Idle)
    }

    /// Loads the current track and tries to play it.
    /// A refused play leaves the deck paused on that track.
    fn load_current(&mut self) {
        let Some(url) = self.current().and_then(|t| t.preview_url.clone()) else {
            return;
        };
        self.sink.load(&url);
        self.sink.set_volume(self.volume);
        match self.sink.play() {
            Ok(()) => self.playing = true,
            Err(e) => {
                log::warn!("deck: {e}");
                self.playing = false;
            }
        }
    }

    fn queue_mut(&mut self) -> Result<&mut PlayQueue, DeckError> {
        self.queue.as_mut().ok_or(DeckError::Idle)
    }

    /// returns whether the deck is playing afterwards
    pub fn toggle_play(&mut self) -> Result<bool, DeckError> {
        if self.queue.is_none() {
            return Err(DeckError::Idle);
        }
        if self.playing {
            self.sink.pause();
            self.playing = false;
        } else {
            match self.sink.play() {
                Ok(()) => self.playing = true,
                Err(e) => {
                    self.playing = false;
                    return Err(e);
                }
            }
        }
        Ok(self.playing)
    }

    pub fn next(&mut self) -> Result<&Track, DeckError> {
        self.next_with(&mut rand::thread_rng())
    }

    pub fn next_with<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Track, DeckError> {
        let shuffle = self.shuffle;
        self.queue_mut()?.advance(shuffle, rng);
        self.load_current();
        self.current().ok_or(DeckError::Idle)
    }

    /// the audio element finished the current track
    pub fn track_ended(&mut self) -> Result<&Track, DeckError> {
        self.next()
    }

    pub fn previous(&mut self) -> Result<&Track, DeckError> {
        self.queue_mut()?.previous();
        self.load_current();
        self.current().ok_or(DeckError::Idle)
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    /// returns the volume actually applied
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.volume
        };
        self.sink.set_volume(self.volume);
        self.volume
    }

    pub fn seek(&mut self, fraction: f64) -> Result<(), DeckError> {
        if self.queue.is_none() {
            return Err(DeckError::Idle);
        }
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.sink.seek(fraction);
        Ok(())
    }

    /// Empties the queue and stops the sink.
    pub fn close(&mut self) {
        self.queue = None;
        self.playing = false;
        self.sink.stop();
    }
}
