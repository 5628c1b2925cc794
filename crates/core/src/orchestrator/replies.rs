//! User-facing reply texts.

use std::fmt::Write;

use crate::searcher::SearchResult;
use crate::session::Handle;
use crate::torrent_client::TorrentInfo;

pub const START: &str = "welcome to the nyaa search and download bot!\n\n\
commands:\n\
/search <query> - search for torrents on nyaa\n\
/download <url> - add a torrent to qbittorrent\n\
/active - list active downloads\n\
you can also use the numbered download buttons after a search.";

pub const ACCESS_DENIED: &str = "sorry, you are not authorized to use this bot.";
pub const SEARCH_USAGE: &str = "please provide a search query. usage: /search <query>";
pub const NO_RESULTS: &str = "no results found.";
pub const HANDLE_NOT_FOUND: &str = "failed to retrieve the torrent URL.";
pub const UNKNOWN_ACTION: &str = "unknown action.";
pub const DOWNLOAD_USAGE: &str = "please provide a torrent URL. usage: /download <url>";
pub const NO_ACTIVE: &str = "no active downloads.";
pub const ACTIVE_FAILED: &str = "failed to retrieve active downloads.";

pub fn searching(query: &str) -> String {
    format!("searching for: {}", query)
}

/// Numbered result list; result `i` belongs to the button of handle `i`.
pub fn search_results(results: &[SearchResult]) -> String {
    let mut text = String::from("search results:\n\n");
    for (i, result) in results.iter().enumerate() {
        let _ = write!(text, "{}. {}\n\n", i + 1, result.display_name);
    }
    text
}

pub fn button_label(handle: Handle) -> String {
    format!("download {}", handle)
}

pub fn active_downloads(torrents: &[TorrentInfo]) -> String {
    let mut text = String::from("active downloads:\n\n");
    for torrent in torrents {
        let _ = writeln!(text, "{} - {:.2}%", torrent.name, torrent.progress * 100.0);
    }
    text
}
