//! Odds and ends used across the other crates: tag collections, progress
//! measurement, a bounded worker pool, and logging setup.

#[macro_use]
extern crate log;

mod collections;
pub mod logger;
mod tags;
mod time;

pub use crate::collections::{
    deserialize_btreemap, serialize_btreemap, wraparound_get, MultiMap,
};
pub use crate::tags::Tags;
pub use crate::time::{elapsed_seconds, Timer};

pub fn to_json<T: serde::Serialize>(x: &T) -> String {
    serde_json::to_string_pretty(x).unwrap()
}
