use rand::Rng;

use super::now_millis;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase base36 suffix, used to keep ids created in the same millisecond apart.
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// id of a manually added track
pub fn new_track_id() -> String {
    format!("track_{}_{}", now_millis(), random_suffix(8))
}

/// id of a playlist
pub fn new_playlist_id() -> String {
    format!("list_{}_{}", now_millis(), random_suffix(8))
}

/// Imported tracks keep the remote identifier visible in their id.
///
/// Falls back to the collection id, and then to the current time,
/// when the search record has no track id.
pub fn imported_track_id(track_id: Option<u64>, collection_id: Option<u64>) -> String {
    let base = track_id
        .or(collection_id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| now_millis().to_string());
    format!("it_{}_{}", base, random_suffix(5))
}
