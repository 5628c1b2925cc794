//! Torrent client abstraction.
//!
//! This module provides the `TorrentConnector` / `TorrentClient` traits used
//! by the dispatcher, and the qBittorrent Web API implementation.

mod qbittorrent;
mod types;

pub use qbittorrent::{QBittorrentClient, QBittorrentConnector};
pub use types::*;
