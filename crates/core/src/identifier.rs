//! Classification of download identifiers.
//!
//! An identifier is whatever a user or search result hands us as "the thing to
//! download": a magnet URI or a direct link to a `.torrent` file.

use serde::{Deserialize, Serialize};

/// Prefix every accepted magnet URI starts with.
pub const MAGNET_PREFIX: &str = "magnet:?xt=urn:btih:";

/// Suffix every accepted torrent link ends with.
pub const TORRENT_SUFFIX: &str = ".torrent";

/// Kind of a download identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// BitTorrent magnet URI with a btih exact topic.
    Magnet,
    /// Direct link to a `.torrent` file.
    TorrentLink,
    /// Anything else.
    Invalid,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Magnet => "magnet",
            IdentifierKind::TorrentLink => "torrent_link",
            IdentifierKind::Invalid => "invalid",
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, IdentifierKind::Invalid)
    }
}

/// Classify an identifier. Magnet wins over torrent link when both match.
pub fn classify(identifier: &str) -> IdentifierKind {
    if identifier.starts_with(MAGNET_PREFIX) {
        IdentifierKind::Magnet
    } else if identifier.ends_with(TORRENT_SUFFIX) {
        IdentifierKind::TorrentLink
    } else {
        IdentifierKind::Invalid
    }
}
