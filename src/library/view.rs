//! Filtered and sorted views over the track list

use std::{fmt::Display, str::FromStr};

use serde::Deserialize;

use crate::domain::track::Track;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// most recently added first
    #[default]
    Newest,
    Title,
    Artist,
    /// favorites first, otherwise library order
    Fav,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(SortBy::Newest),
            "title" => Ok(SortBy::Title),
            "artist" => Ok(SortBy::Artist),
            "fav" | "favorites" => Ok(SortBy::Fav),
            other => Err(format!(
                "unknown sort order '{other}', expected newest, title, artist or fav"
            )),
        }
    }
}

impl Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortBy::Newest => "newest",
            SortBy::Title => "title",
            SortBy::Artist => "artist",
            SortBy::Fav => "fav",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackFilter {
    /// free text, matched against title, artist, album and genre
    #[serde(default)]
    pub query: Option<String>,
    /// exact genre, case-insensitive
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub sort: SortBy,
}

fn lower(value: Option<&str>) -> String {
    value.unwrap_or_default().to_lowercase()
}

impl TrackFilter {
    fn matches(&self, track: &Track) -> bool {
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = query.to_lowercase();
            let hit = track.title.to_lowercase().contains(&q)
                || track.artist.to_lowercase().contains(&q)
                || lower(track.album.as_deref()).contains(&q)
                || lower(track.genre.as_deref()).contains(&q);
            if !hit {
                return false;
            }
        }

        match self.genre.as_deref().filter(|g| !g.is_empty()) {
            Some(genre) => lower(track.genre.as_deref()) == genre.to_lowercase(),
            None => true,
        }
    }
}

/// Applies the filter and the sort order. Sorting is stable.
pub fn filter_tracks<'a>(tracks: &'a [Track], filter: &TrackFilter) -> Vec<&'a Track> {
    let mut result = tracks
        .iter()
        .filter(|t| filter.matches(t))
        .collect::<Vec<_>>();

    match filter.sort {
        SortBy::Newest => result.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
        SortBy::Title => result.sort_by_cached_key(|t| t.title.to_lowercase()),
        SortBy::Artist => result.sort_by_cached_key(|t| t.artist.to_lowercase()),
        SortBy::Fav => result.sort_by_key(|t| !t.favorite),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::mock_track;

    fn sample() -> Vec<Track> {
        let mut a = mock_track("a", "banana", "Zed", 10);
        a.genre = Some("Jazz".to_string());
        let mut b = mock_track("b", "Apple", "amy", 30);
        b.album = Some("Orchard Sessions".to_string());
        b.favorite = true;
        let mut c = mock_track("c", "cherry", "Bob", 20);
        c.genre = Some("jazz".to_string());
        let d = mock_track("d", "apricot", "Cal", 20);
        vec![a, b, c, d]
    }

    fn ids(tracks: Vec<&Track>) -> Vec<&str> {
        tracks.into_iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_newest_is_non_increasing() {
        let tracks = sample();
        let sorted = filter_tracks(&tracks, &TrackFilter::default());

        assert!(sorted.windows(2).all(|w| w[0].added_at >= w[1].added_at));
        // equal timestamps keep library order
        assert_eq!(ids(sorted), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_title_sort_is_case_insensitive() {
        let tracks = sample();
        let filter = TrackFilter {
            sort: SortBy::Title,
            ..Default::default()
        };

        assert_eq!(ids(filter_tracks(&tracks, &filter)), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_artist_sort() {
        let tracks = sample();
        let filter = TrackFilter {
            sort: SortBy::Artist,
            ..Default::default()
        };

        assert_eq!(ids(filter_tracks(&tracks, &filter)), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_fav_sort_puts_favorites_first() {
        let tracks = sample();
        let filter = TrackFilter {
            sort: SortBy::Fav,
            ..Default::default()
        };

        assert_eq!(ids(filter_tracks(&tracks, &filter)), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_query_matches_any_text_field() {
        let tracks = sample();
        let mut filter = TrackFilter {
            query: Some("  ORCHARD ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(filter_tracks(&tracks, &filter)), vec!["b"]);

        filter.query = Some("jazz".to_string());
        assert_eq!(ids(filter_tracks(&tracks, &filter)), vec!["c", "a"]);

        filter.query = Some("   ".to_string());
        assert_eq!(filter_tracks(&tracks, &filter).len(), 4);
    }

    #[test]
    fn test_genre_filter_is_exact() {
        let tracks = sample();
        let mut filter = TrackFilter {
            genre: Some("JAZZ".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(filter_tracks(&tracks, &filter)), vec!["c", "a"]);

        filter.genre = Some("jaz".to_string());
        assert!(filter_tracks(&tracks, &filter).is_empty());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!("Title".parse::<SortBy>(), Ok(SortBy::Title));
        assert_eq!("favorites".parse::<SortBy>(), Ok(SortBy::Fav));
        assert!("random".parse::<SortBy>().is_err());
    }
}
