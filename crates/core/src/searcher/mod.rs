//! Torrent search abstraction.
//!
//! This module provides a `Searcher` trait for querying a torrent index and
//! the Nyaa JSON API implementation.

mod nyaa;
mod types;

pub use nyaa::{parse_results, NyaaSearcher};
pub use types::*;
