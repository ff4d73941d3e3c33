pub mod id;
pub mod playlist;
pub mod track;

/// milliseconds since unix epoch, the unit of every timestamp in the library
pub type Millis = i64;

pub fn now_millis() -> Millis {
    chrono::Utc::now().timestamp_millis()
}
