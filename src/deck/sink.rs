use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::deck::error::DeckError;

/// The single audio element the deck drives.
pub trait AudioSink: Send {
    /// replaces the current source
    fn load(&mut self, url: &str);
    fn play(&mut self) -> Result<(), DeckError>;
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f32);
    /// jump to a fraction (0..=1) of the current source duration
    fn seek(&mut self, fraction: f64);
    fn stop(&mut self);
}

/// Desired state of the browser audio element.
///
/// `revision` grows on every change so the page can tell a fresh
/// load or seek request from one it has already applied. `seek_to` is
/// only set in the revision that asked for the seek.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioState {
    pub src: Option<String>,
    pub paused: bool,
    pub volume: f32,
    pub seek_to: Option<f64>,
    pub revision: u64,
}

/// Sink whose audio element lives in the deck page. The page polls the
/// shared state and reports back when a track ends.
#[derive(Debug, Clone, Default)]
pub struct RemoteSink {
    state: Arc<Mutex<AudioState>>,
}

impl RemoteSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AudioState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut AudioState)) {
        match self.state.lock() {
            Ok(mut state) => {
                state.seek_to = None;
                f(&mut state);
                state.revision += 1;
            }
            Err(e) => log::error!("audio state lock poisoned: {e}"),
        }
    }
}

impl AudioSink for RemoteSink {
    fn load(&mut self, url: &str) {
        self.update(|s| {
            s.src = Some(url.to_string());
            s.paused = true;
        });
    }

    fn play(&mut self) -> Result<(), DeckError> {
        let mut result = Ok(());
        self.update(|s| {
            if s.src.is_some() {
                s.paused = false;
            } else {
                result = Err(DeckError::Playback("no source loaded".to_string()));
            }
        });
        result
    }

    fn pause(&mut self) {
        self.update(|s| s.paused = true);
    }

    fn set_volume(&mut self, volume: f32) {
        self.update(|s| s.volume = volume);
    }

    fn seek(&mut self, fraction: f64) {
        self.update(|s| s.seek_to = Some(fraction));
    }

    fn stop(&mut self) {
        self.update(|s| {
            s.src = None;
            s.paused = true;
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every call, optionally refusing to play.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingSink {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub refuse_play: bool,
    }

    impl RecordingSink {
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl AudioSink for RecordingSink {
        fn load(&mut self, url: &str) {
            self.push(format!("load {url}"));
        }

        fn play(&mut self) -> Result<(), DeckError> {
            self.push("play".to_string());
            if self.refuse_play {
                Err(DeckError::Playback("autoplay blocked".to_string()))
            } else {
                Ok(())
            }
        }

        fn pause(&mut self) {
            self.push("pause".to_string());
        }

        fn set_volume(&mut self, volume: f32) {
            self.push(format!("volume {volume}"));
        }

        fn seek(&mut self, fraction: f64) {
            self.push(format!("seek {fraction}"));
        }

        fn stop(&mut self) {
            self.push("stop".to_string());
        }
    }

    #[test]
    fn test_remote_sink_tracks_state() {
        let mut sink = RemoteSink::new();
        let observer = sink.clone();

        assert!(sink.play().is_err());

        sink.load("https://audio.example/a.m4a");
        sink.set_volume(0.5);
        sink.play().unwrap();

        let state = observer.state();
        assert_eq!(state.src.as_deref(), Some("https://audio.example/a.m4a"));
        assert!(!state.paused);
        assert_eq!(state.volume, 0.5);

        let before = state.revision;
        sink.seek(0.25);
        let state = observer.state();
        assert_eq!(state.seek_to, Some(0.25));
        assert!(state.revision > before);

        sink.stop();
        assert_eq!(observer.state().src, None);
    }

    #[test]
    fn test_seek_is_not_repeated_by_later_changes() {
        let mut sink = RemoteSink::new();
        sink.load("https://audio.example/a.m4a");
        sink.play().unwrap();

        sink.seek(0.25);
        assert_eq!(sink.state().seek_to, Some(0.25));

        sink.pause();
        let paused = sink.state();
        assert_eq!(paused.seek_to, None);
        assert!(paused.paused);

        sink.set_volume(0.5);
        assert_eq!(sink.state().seek_to, None);
        assert_eq!(sink.state().src.as_deref(), Some("https://audio.example/a.m4a"));
    }
}
