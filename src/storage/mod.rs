//! Local key/value store, standing in for browser local storage.
//!
//! Every record is a string value under a fixed key. The library itself is
//! one JSON record, rewritten after every mutation.

pub mod backup;
pub mod db;
pub mod error;
pub mod operations;
pub(crate) mod schema;
