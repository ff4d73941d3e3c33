use rand::Rng;

use crate::{deck::error::DeckError, domain::track::Track};

/// Flat ordered list of playable tracks with a cursor
#[derive(Debug, Clone)]
pub struct PlayQueue {
    tracks: Vec<Track>,
    index: usize,
}

impl PlayQueue {
    /// Keeps only tracks with a preview url; starts at the first one.
    pub fn new(tracks: Vec<Track>) -> Result<Self, DeckError> {
        let tracks = tracks
            .into_iter()
            .filter(Track::is_playable)
            .collect::<Vec<_>>();
        if tracks.is_empty() {
            return Err(DeckError::NothingPlayable);
        }
        Ok(Self { tracks, index: 0 })
    }

    pub fn current(&self) -> &Track {
        &self.tracks[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Sequential order wraps around; shuffle picks any index uniformly,
    /// the current one included.
    pub fn advance<R: Rng + ?Sized>(&mut self, shuffle: bool, rng: &mut R) -> &Track {
        self.index = if shuffle {
            rng.gen_range(0..self.tracks.len())
        } else {
            (self.index + 1) % self.tracks.len()
        };
        self.current()
    }

    pub fn previous(&mut self) -> &Track {
        self.index = if self.index > 0 {
            self.index - 1
        } else {
            self.tracks.len() - 1
        };
        self.current()
    }
}
